//! End-to-end build of a small themed blog through the public API.
//!
//! The site exercises every phase: sections and taxonomies with pagination,
//! a synthesized homepage, front-matter and pagination aliases, menus with a
//! config override, site layouts shadowing theme layouts, and static files
//! from both the theme and the site.

use plinth::pipeline::{BuildError, BuildOptions, build_site, check_site};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
theme = "paper"

[site]
title = "Test Site"

[site.params]
author = "Jo"

[site.paginate]
max = 2

[[site.menu]]
menu = "main"
id = "github"
name = "GitHub"
url = "https://github.com/example"
weight = 200
"#;

const PAGE_LAYOUT: &str = "<title>{{ page.title }} | {{ site.title }}</title>\
<nav>{% for e in menus.main %}<a href=\"{{ e.url }}\">{{ e.name }}</a>{% endfor %}</nav>\
<main>{{ page.html | safe }}</main>";

const LIST_LAYOUT: &str = "<h1>{{ page.title }}</h1>\
<ul>{% for p in page.pages %}<li><a href=\"{{ p.permalink }}\">{{ p.title }}</a></li>{% endfor %}</ul>\
{% if page.paginator %}\
{% if page.paginator.prev %}<a rel=\"prev\" href=\"{{ page.paginator.prev }}\">prev</a>{% endif %}\
{% if page.paginator.next %}<a rel=\"next\" href=\"{{ page.paginator.next }}\">next</a>{% endif %}\
{% endif %}";

const POST_LAYOUT: &str =
    "<article>{{ page.title }}|{{ page.date }}|{{ page.params.tags | join(\",\") }}|{{ site.params.author }}</article>";

const TERMS_LAYOUT: &str = "{% for t in page.pages %}{{ t.title }};{% endfor %}";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
}

fn blog() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "plinth.toml", CONFIG);

    write(
        root,
        "content/about.md",
        "---\ntitle: About\nmenu:\n  main:\n    weight: 5\n---\nAbout *us*.\n",
    );
    write(
        root,
        "content/post/p1.md",
        "---\ntitle: Post One\ndate: 2024-01-01\ntags: rust\n---\nFirst.\n",
    );
    write(
        root,
        "content/post/p2.md",
        "---\ntitle: Post Two\ndate: 2024-02-01\ntags: [rust, web]\naliases: [/2024/p2/]\n---\nSecond.\n",
    );
    write(
        root,
        "content/post/p3.md",
        "---\ntitle: Post Three\ndate: 2024-03-01\ntags: [rust]\n---\nThird.\n",
    );
    write(
        root,
        "content/post/wip.md",
        "---\ntitle: Unfinished\ndraft: true\n---\nLater.\n",
    );

    write(root, "layouts/_default/page.html", PAGE_LAYOUT);
    write(root, "layouts/_default/list.html", LIST_LAYOUT);
    write(root, "layouts/post/page.html", POST_LAYOUT);
    write(root, "themes/paper/layouts/_default/terms.html", TERMS_LAYOUT);
    write(root, "themes/paper/layouts/_default/page.html", "theme page");

    write(root, "themes/paper/static/style.css", "theme css");
    write(root, "themes/paper/static/theme.js", "theme js");
    write(root, "static/style.css", "site css");
    tmp
}

fn options(tmp: &TempDir) -> BuildOptions {
    BuildOptions {
        source: tmp.path().to_path_buf(),
        dest: tmp.path().to_path_buf(),
    }
}

#[test]
fn builds_a_complete_site() {
    let tmp = blog();
    let report = build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");
    assert_eq!(report.output_dir, public);

    // Content page through the site's default layout, with menus in weight order
    let about = read(&public, "about/index.html");
    assert!(about.contains("<title>About | Test Site</title>"));
    assert!(about.contains("<em>us</em>"));
    let nav_order: Vec<usize> = ["Test Site", "About", "post", "GitHub"]
        .iter()
        .map(|name| about.find(&format!(">{name}</a>")).unwrap())
        .collect();
    assert!(nav_order.windows(2).all(|w| w[0] < w[1]), "{about}");

    // Section-specific layout beats the generic one
    assert_eq!(
        read(&public, "post/p2/index.html"),
        "<article>Post Two|2024-02-01|rust,web|Jo</article>"
    );

    // Drafts are not published
    assert!(!public.join("post/wip").exists());
}

#[test]
fn paginates_listings_newest_first() {
    let tmp = blog();
    build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");

    let home = read(&public, "index.html");
    assert!(home.contains("<h1>Test Site</h1>"));
    assert!(home.find("Post Three").unwrap() < home.find("Post Two").unwrap());
    assert!(!home.contains("Post One"));
    assert!(home.contains(r#"rel="next""#));
    assert!(!home.contains(r#"rel="prev""#));

    let home_2 = read(&public, "page/2/index.html");
    assert!(home_2.contains("Post One"));
    assert!(home_2.contains(r#"rel="prev""#));
    assert!(!home_2.contains(r#"rel="next""#));

    let section_2 = read(&public, "post/page/2/index.html");
    assert!(section_2.contains(">Post One</a>"));
    assert!(!section_2.contains("Post Three"));
}

#[test]
fn synthesizes_taxonomies_from_theme_and_site_layouts() {
    let tmp = blog();
    build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");

    let rust = read(&public, "tags/rust/index.html");
    assert!(rust.contains("<h1>rust</h1>"));
    assert!(public.join("tags/rust/page/2/index.html").is_file());

    let web = read(&public, "tags/web/index.html");
    assert!(web.contains("Post Two"));
    assert!(!web.contains("Post One"));

    // Vocabulary index resolves only in the theme
    assert_eq!(read(&public, "tags/index.html"), "rust;web;");
    assert!(!public.join("categories").exists());
}

#[test]
fn writes_redirects_for_aliases() {
    let tmp = blog();
    let report = build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");

    assert!(read(&public, "2024/p2/index.html").contains("url=/post/p2/"));
    assert!(read(&public, "post/page/1/index.html").contains("url=/post/"));
    assert!(read(&public, "page/1/index.html").contains(r#"url=/""#));
    assert!(report.redirects() >= 4);
}

#[test]
fn site_static_overrides_theme_static() {
    let tmp = blog();
    let report = build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");

    assert_eq!(report.assets, 2);
    assert_eq!(read(&public, "style.css"), "site css");
    assert_eq!(read(&public, "theme.js"), "theme js");
}

#[test]
fn empty_content_still_builds_a_homepage() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "layouts/_default/list.html", LIST_LAYOUT);
    let report = build_site(options(&tmp)).unwrap();
    assert_eq!(report.pages.len(), 1);
    assert!(read(&tmp.path().join("public"), "index.html").contains("<h1>Home</h1>"));
}

#[test]
fn check_writes_nothing() {
    let tmp = blog();
    let report = check_site(options(&tmp)).unwrap();
    assert_eq!(report.layouts.len(), report.site.store.len());
    assert!(!tmp.path().join("public").exists());
}

#[test]
fn missing_layout_aborts_the_build() {
    let tmp = blog();
    fs::remove_file(tmp.path().join("layouts/_default/list.html")).unwrap();
    let err = build_site(options(&tmp)).unwrap_err();
    assert!(matches!(err, BuildError::Render(_)), "{err}");
    assert!(err.to_string().contains("no layout found"));
}

#[test]
fn tag_named_index_gets_its_own_directory() {
    let tmp = blog();
    write(
        tmp.path(),
        "content/post/p4.md",
        "---\ntitle: Post Four\ndate: 2024-04-01\ntags: [index]\n---\nFourth.\n",
    );
    build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");

    assert!(read(&public, "tags/index-term/index.html").contains("Post Four"));
    assert_eq!(read(&public, "tags/index.html"), "rust;web;index;");
}

#[test]
fn dotted_content_names_are_directories() {
    let tmp = blog();
    write(tmp.path(), "content/release-1.0.md", "---\ntitle: Release\n---\nShipped.\n");
    build_site(options(&tmp)).unwrap();
    let public = tmp.path().join("public");

    assert!(read(&public, "release-1.0/index.html").contains("<title>Release | Test Site</title>"));
}
