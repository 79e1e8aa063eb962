use ghpi_schema::{PackageFile, PackageName};
use maud::{DOCTYPE, Markup, html};

use super::RenderConfig;
use crate::index::PackageIndex;

/// A simple repository API 1.0 page. Text and attributes are escaped by maud.
fn page(title: &str, links: &Markup) -> String {
    html! {
        (DOCTYPE)
        html {
            head {
                meta name="pypi:repository-version" content="1.0";
                title { (title) }
            }
            body {
                h1 { (title) }
                (links)
            }
        }
    }
    .into_string()
}

pub(super) fn root_page(index: &PackageIndex, config: &RenderConfig) -> String {
    let links = html! {
        @for (name, _) in index.packages() {
            a href={ "./" (name.as_str()) "/" } { (name.as_str()) }
            br;
        }
    };
    page(&config.title, &links)
}

pub(super) fn package_page(name: &PackageName, files: &[PackageFile], config: &RenderConfig) -> String {
    let links = html! {
        @for file in files {
            a href=(file_href(file, config)) { (file.filename) }
            br;
        }
    };
    page(&format!("Links for {}", name.as_str()), &links)
}

fn file_href(file: &PackageFile, config: &RenderConfig) -> String {
    let mut href = config.file_url(file);
    if let Some(hash) = &file.hash {
        href.push('#');
        href.push_str(&hash.fragment());
    }
    href
}
