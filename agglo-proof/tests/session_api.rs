//! End-to-end exercise of the process-wide scheduler session.
//!
//! The session state is ambient, so the whole lifecycle runs inside one
//! test: accessors before initialization, bounds rejection, missing and
//! malformed files, review decisions, statistics, and the undo round trip
//! back to a byte-identical export.

use agglo_core::Rag;
use agglo_proof::ProofError;
use std::fs;
use std::path::PathBuf;

fn sample_rag() -> Rag {
    let mut rag = Rag::new();
    for (id, size, boundary) in [(1, 40, 24), (2, 30, 20), (3, 22, 18), (4, 9, 8), (5, 14, 10)] {
        rag.add_node(id, size).unwrap();
        rag.node_mut(id).unwrap().boundary_size = boundary;
    }
    for (u, v, size, w) in [
        (1, 2, 5, 0.48),
        (1, 3, 4, 0.85),
        (2, 3, 6, 0.55),
        (3, 4, 2, 0.15),
        (4, 5, 3, 0.35),
        (2, 5, 2, 0.6),
    ] {
        rag.add_edge(u, v, size).unwrap();
        let e = rag.find_edge_mut(u, v).unwrap();
        e.weight = w;
        e.location = Some([u, v, u + v]);
    }
    rag
}

fn graph_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("graph.json");
    agglo_core::graph_io::write_graph(&path, &sample_rag(), None).unwrap();
    path
}

#[test]
fn session_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = graph_file(&dir);

    // every accessor fails before initialization
    assert!(matches!(
        agglo_proof::get_next_edge(),
        Err(ProofError::NotInitialized)
    ));
    assert!(matches!(
        agglo_proof::set_edge_result((1, 2), true),
        Err(ProofError::NotInitialized)
    ));
    assert!(matches!(
        agglo_proof::undo(),
        Err(ProofError::NotInitialized)
    ));
    assert!(matches!(
        agglo_proof::get_estimated_num_remaining_edges(),
        Err(ProofError::NotInitialized)
    ));
    assert!(matches!(
        agglo_proof::export(&dir.path().join("out.json")),
        Err(ProofError::NotInitialized)
    ));

    // illegal bounds are rejected before the file is touched
    assert!(matches!(
        agglo_proof::initialize(&path, -0.1, 1.0, 0.0),
        Err(ProofError::InvalidBounds { .. })
    ));

    // missing and malformed files report failure without an error
    assert_eq!(
        agglo_proof::initialize(&dir.path().join("nope.json"), 0.0, 1.0, 0.5).unwrap(),
        false
    );
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not a graph").unwrap();
    assert_eq!(agglo_proof::initialize(&bad, 0.0, 1.0, 0.5).unwrap(), false);

    // a real session
    assert!(agglo_proof::initialize(&path, 0.0, 1.0, 0.5).unwrap());
    assert_eq!(agglo_proof::get_estimated_num_remaining_edges().unwrap(), 6);

    // export before any decision reproduces the file byte for byte
    let exported = dir.path().join("exported.json");
    assert!(agglo_proof::export(&exported).unwrap());
    let original_bytes = fs::read(&path).unwrap();
    assert_eq!(fs::read(&exported).unwrap(), original_bytes);

    // the top edge is the one closest to the cursor
    let ((u, v), location) = agglo_proof::get_next_edge().unwrap().unwrap();
    assert_eq!((u, v), (1, 2));
    assert_eq!(location, (1, 2, 3));

    // five decisions, then five undos, back to the original bytes
    agglo_proof::set_edge_result((2, 3), true).unwrap();
    agglo_proof::set_edge_result((1, 2), false).unwrap();
    agglo_proof::set_edge_result((2, 4), true).unwrap();
    agglo_proof::set_edge_result((2, 5), false).unwrap();
    agglo_proof::set_edge_result((1, 2), true).unwrap();

    assert!(agglo_proof::get_average_prediction_error().unwrap() > 0.0);
    assert!(agglo_proof::get_percent_prediction_correct().unwrap() > 0.0);

    for _ in 0..5 {
        assert!(agglo_proof::undo().unwrap());
    }
    assert!(!agglo_proof::undo().unwrap());

    let restored = dir.path().join("restored.json");
    assert!(agglo_proof::export(&restored).unwrap());
    assert_eq!(fs::read(&restored).unwrap(), original_bytes);
    assert_eq!(agglo_proof::get_estimated_num_remaining_edges().unwrap(), 6);

    // re-initialization replaces the session wholesale
    assert!(agglo_proof::initialize(&path, 0.0, 1.0, 0.5).unwrap());
    assert_eq!(agglo_proof::get_estimated_num_remaining_edges().unwrap(), 6);
    assert_eq!(agglo_proof::get_average_prediction_error().unwrap(), 0.0);

    // drain the session to completion
    while let Some(((u, v), _)) = agglo_proof::get_next_edge().unwrap() {
        agglo_proof::set_edge_result((u, v), false).unwrap();
    }
    assert_eq!(agglo_proof::get_next_edge().unwrap(), None);
}
