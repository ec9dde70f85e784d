//! Walks of realistic project trees through the deploy filter.

use siteship::deploy::collect_files;

use crate::fixture::DeployFolder;

#[test]
fn realistic_project_tree_keeps_only_deployable_files() {
    let folder = DeployFolder::new()
        .file("index.html", b"<html></html>")
        .file("assets/app.js", b"app")
        .file("assets/logo.svg", b"<svg/>")
        .file(".git/HEAD", b"ref: refs/heads/main")
        .file(".git/objects/ab/cdef01", b"blob")
        .file("node_modules/react/index.js", b"module.exports = {}")
        .file("docs/node_modules/left-pad/index.js", b"pad")
        .file(".env", b"SECRET=1")
        .file(".env.production", b"SECRET=2")
        .file(".DS_Store", b"")
        .file("certs/server.pem", b"cert")
        .file("certs/server.key", b"key")
        .file(".deploy.json", b"{}")
        .file("id_rsa", b"private")
        .file("docs/readme.md", b"# readme");

    let files = collect_files(folder.path()).unwrap();
    assert_eq!(
        files,
        vec![
            "assets/app.js",
            "assets/logo.svg",
            "docs/readme.md",
            "index.html",
        ]
    );
}

#[test]
fn lookalike_names_survive_the_walk() {
    let folder = DeployFolder::new()
        .file(".github/workflows/ci.yml", b"jobs:")
        .file("envoy.yaml", b"listeners:")
        .file("node_modules_backup/kept.js", b"kept")
        .file("index.html", b"<html></html>");

    let files = collect_files(folder.path()).unwrap();
    assert_eq!(
        files,
        vec![
            ".github/workflows/ci.yml",
            "envoy.yaml",
            "index.html",
            "node_modules_backup/kept.js",
        ]
    );
}

#[test]
fn deep_nesting_is_walked_fully() {
    let folder = DeployFolder::new()
        .file("a/b/c/d/e/f/page.html", b"deep")
        .file("a/b/node_modules/x/y.js", b"pruned")
        .file("index.html", b"<html></html>");

    let files = collect_files(folder.path()).unwrap();
    assert_eq!(files, vec!["a/b/c/d/e/f/page.html", "index.html"]);
}
