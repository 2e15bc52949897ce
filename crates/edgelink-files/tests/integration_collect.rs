//! Integration tests for collecting a build output into a virtual filesystem.
//!
//! Simulates a compiled server tree next to a public tree and checks the
//! whole collect, classify, embed flow.

use edgelink_files::{Classifier, LookupStage, VfsBuilder, collect_inputs};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> (TempDir, TempDir) {
    let server = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();

    write(server.path(), "index.mjs", "import './chunks/_/nitro.mjs';");
    write(server.path(), "chunks/_/nitro.mjs", "export const useNitroApp = () => {};");
    write(server.path(), "chunks/routes/home.mjs", "export default 1;");
    write(server.path(), "chunks/build/styles.css", "body{}");
    write(server.path(), "public/assets/entry.js", "console.log('client');");
    write(server.path(), "public/_payload.json", "{\"from\":\"server\"}");

    write(public.path(), "index.html", "<html></html>");
    write(public.path(), "assets/entry.js", "console.log('client');");
    write(public.path(), "_payload.json", "{\"from\":\"public\"}");

    (server, public)
}

#[test]
fn test_collect_classify_embed() {
    let (server, public) = fixture();

    let records = collect_inputs(server.path(), public.path()).unwrap();
    assert_eq!(records.len(), 9);

    let classified = Classifier::new("public/assets/").partition(records);

    let modules: Vec<_> = classified.executable.iter().map(|r| r.path().as_str()).collect();
    assert_eq!(
        modules,
        vec!["chunks/_/nitro.mjs", "chunks/routes/home.mjs", "index.mjs"]
    );
    assert_eq!(classified.dropped.len(), 1);
    assert_eq!(classified.dropped[0].as_str(), "public/assets/entry.js");

    let vfs = VfsBuilder::from_records(classified.embeddable).build().unwrap();

    // no executable module ever lands in the VFS
    for module in &modules {
        assert!(vfs.get(module).is_none());
    }

    // the public copy of a duplicated key wins
    assert_eq!(vfs.get("public/_payload.json"), Some("{\"from\":\"public\"}"));

    // public scripts are embedded as plain assets
    assert!(vfs.get("public/assets/entry.js").is_some());
    assert_eq!(vfs.file_count(), 4);
}

#[test]
fn test_runtime_style_lookups() {
    let (server, public) = fixture();

    let records = collect_inputs(server.path(), public.path()).unwrap();
    let classified = Classifier::new("public/assets/").partition(records);
    let vfs = VfsBuilder::from_records(classified.embeddable).build().unwrap();

    let hit = vfs.lookup("/app/.output/server/chunks/build/styles.css").unwrap();
    assert_eq!(hit.stage, LookupStage::Suffix);
    assert_eq!(hit.content, "body{}");

    let hit = vfs.lookup(r"C:\app\dist\..\public\index.html").unwrap();
    assert_eq!(hit.stage, LookupStage::Exact);

    let hit = vfs.lookup("index.html").unwrap();
    assert_eq!(hit.stage, LookupStage::Basename);

    let err = vfs.lookup("missing.txt").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_collection_is_deterministic() {
    let (server, public) = fixture();

    let first: Vec<_> = collect_inputs(server.path(), public.path())
        .unwrap()
        .into_iter()
        .map(|r| r.path().to_string())
        .collect();
    let second: Vec<_> = collect_inputs(server.path(), public.path())
        .unwrap()
        .into_iter()
        .map(|r| r.path().to_string())
        .collect();

    assert_eq!(first, second);
}
