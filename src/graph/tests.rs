//! Stage tests over small hand-built shards

use super::*;
use crate::corpus::{scan_reader, QueryFilter, ShardScan};
use std::path::Path;

fn paper(id: &str, fields: &[&str], safe: bool, cites: &[&str]) -> String {
    serde_json::json!({
        "paper_id": id,
        "title": format!("Title {}", id),
        "mag_field_of_study": fields,
        "has_pdf_parse": true,
        "has_pdf_parsed_abstract": safe,
        "has_outbound_citations": !cites.is_empty(),
        "outbound_citations": cites,
    })
    .to_string()
}

fn scan(shard: usize, lines: &[String]) -> ShardScan {
    let text = lines.join("\n");
    scan_reader(shard, text.as_bytes(), &QueryFilter::new(), true, Path::new("inline")).unwrap()
}

fn weights(map: &CitationMap, query: &str) -> Vec<(String, u8)> {
    map.get(query)
        .map(|c| c.iter().map(|(id, w)| (id.to_string(), w.count)).collect())
        .unwrap_or_default()
}

/// A → [B, C]; B → [C, D]; D lacks an abstract.
fn example_corpus() -> CorpusGraph {
    build_corpus(vec![scan(
        0,
        &[
            paper("A", &["Biology"], true, &["B", "C"]),
            paper("B", &["Biology"], true, &["C", "D"]),
            paper("C", &["Biology"], true, &[]),
            paper("D", &["Biology"], false, &[]),
        ],
    )])
}

#[test]
fn example_direct_graph() {
    let corpus = example_corpus();
    assert_eq!(
        weights(&corpus.direct, "A"),
        vec![("B".to_string(), 5), ("C".to_string(), 5)]
    );
    assert_eq!(
        weights(&corpus.direct, "B"),
        vec![("C".to_string(), 5), ("D".to_string(), 5)]
    );
    assert_eq!(corpus.direct.len(), 2);
    assert_eq!(corpus.owner_of("A"), Some(0));
    assert_eq!(corpus.owner_of("C"), None);
}

#[test]
fn example_sanitize_drops_unsafe_target() {
    let corpus = example_corpus();
    let sanitized = sanitize_all(&corpus, &[0], false);

    assert_eq!(weights(&sanitized.citations, "B"), vec![("C".to_string(), 5)]);
    assert_eq!(sanitized.removed_citations, 1);
    assert_eq!(sanitized.dropped_queries, 0);
}

#[test]
fn example_indirect_expansion_adds_nothing() {
    let corpus = example_corpus();
    let mut sanitized = sanitize_all(&corpus, &[0], false);

    let stats = expand_all(&mut sanitized, &corpus.direct, &corpus.safety);

    assert_eq!(stats.indirect_edges, 0);
    assert_eq!(
        weights(&sanitized.citations, "A"),
        vec![("B".to_string(), 5), ("C".to_string(), 5)]
    );
    assert_eq!(weights(&sanitized.citations, "B"), vec![("C".to_string(), 5)]);
}

#[test]
fn indirect_reads_original_graph_across_shards() {
    // A → B; B → C (shard 1). C is safe and not cited by A.
    let corpus = build_corpus(vec![
        scan(0, &[paper("A", &["Physics"], true, &["B"])]),
        scan(
            1,
            &[
                paper("B", &["Physics"], true, &["C", "X"]),
                paper("C", &["Physics"], true, &[]),
                paper("X", &["Physics"], false, &[]),
            ],
        ),
    ]);
    let mut sanitized = sanitize_all(&corpus, &[0, 1], false);
    let stats = expand_all(&mut sanitized, &corpus.direct, &corpus.safety);

    assert_eq!(stats.indirect_edges, 1);
    assert_eq!(
        weights(&sanitized.citations, "A"),
        vec![("B".to_string(), 5), ("C".to_string(), 1)]
    );
}

#[test]
fn indirect_excludes_self_citation_cycles() {
    let corpus = build_corpus(vec![scan(
        0,
        &[
            paper("A", &["Physics"], true, &["B"]),
            paper("B", &["Physics"], true, &["A"]),
        ],
    )]);
    let sanitized = sanitize_all(&corpus, &[0], false);
    let indirect = indirect_for(
        &PaperId::from("A"),
        &sanitized.citations,
        &corpus.direct,
        &corpus.safety,
    );
    assert!(indirect.is_empty());
}

#[test]
fn sanitize_removes_emptied_query_everywhere() {
    let corpus = build_corpus(vec![scan(
        0,
        &[
            paper("E", &["Art", "History"], true, &["D"]),
            paper("F", &["Art"], true, &["G"]),
            paper("G", &["Art"], true, &[]),
            paper("D", &["Art"], false, &[]),
        ],
    )]);
    let sanitized = sanitize_all(&corpus, &[0], false);

    assert!(!sanitized.citations.contains("E"));
    assert_eq!(sanitized.dropped_queries, 1);
    let fields = sanitized.field_index();
    assert!(!fields.contains_paper("E"));
    assert_eq!(fields.get("History"), None);
    assert_eq!(fields.get("Art").unwrap(), &[PaperId::from("F")]);
}

#[test]
fn every_surviving_target_is_safe() {
    let corpus = build_corpus(vec![
        scan(
            0,
            &[
                paper("A", &["Art"], true, &["B", "U1", "never-seen"]),
                paper("B", &["Art"], true, &["U2", "A"]),
            ],
        ),
        scan(
            1,
            &[
                paper("U1", &["Art"], false, &[]),
                paper("U2", &[], true, &[]),
            ],
        ),
    ]);
    let mut sanitized = sanitize_all(&corpus, &[0, 1], false);
    expand_all(&mut sanitized, &corpus.direct, &corpus.safety);

    for (_, citations) in sanitized.citations.iter() {
        for target in citations.keys() {
            assert!(corpus.safety.is_safe(target.as_str()), "unsafe target {}", target);
        }
    }
}

#[test]
fn sanitize_only_selected_shards() {
    let corpus = build_corpus(vec![
        scan(0, &[paper("A", &["Art"], true, &["B"])]),
        scan(1, &[paper("B", &["Art"], true, &["A"])]),
    ]);
    let sanitized = sanitize_all(&corpus, &[1], false);
    assert!(sanitized.citations.contains("B"));
    assert!(!sanitized.citations.contains("A"));
}

#[test]
fn cocite_mode_drops_queries_without_safe_citers() {
    let lines = [
        serde_json::json!({
            "paper_id": "A", "mag_field_of_study": ["Art"], "has_pdf_parse": true,
            "has_pdf_parsed_abstract": true, "has_outbound_citations": true,
            "outbound_citations": ["B"], "has_inbound_citations": true,
            "inbound_citations": ["U"]
        })
        .to_string(),
        paper("B", &["Art"], true, &[]),
        paper("U", &["Art"], false, &[]),
    ];
    let text = lines.join("\n");
    let filter = QueryFilter::new().cocite(true);
    let scan = scan_reader(0, text.as_bytes(), &filter, true, Path::new("inline")).unwrap();
    let corpus = build_corpus(vec![scan]);

    let sanitized = sanitize_all(&corpus, &[0], true);
    assert!(sanitized.citations.is_empty());
    assert_eq!(sanitized.dropped_queries, 1);
}
