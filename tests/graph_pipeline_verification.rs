//! Pipeline Verification Tests
//! Report text -> Results -> per-analysis graphs -> union -> DOT.

use soaap_graph::domain::analysis::{extract, extract_all, Analysis};
use soaap_graph::domain::callgraph::{CallGraph, Marker, NodeKind};
use soaap_graph::infrastructure::report_parser::parse_report;
use soaap_graph::ports::{DotExporter, OutputExporter};
use soaap_graph::Error;

const REPORT: &str = r#"{
  "soaap": {
    "vulnerability_warning": [
      {"function": "h", "sandbox": "parser", "cve": ["CVE-2014-0160"],
       "location": {"file": "h.c", "line": 10}}
    ],
    "private_access": [
      {"function": "read_key", "variable": "master_key", "sandbox": "parser"}
    ],
    "traces": [
      {"callsites": [
        {"function": "f", "sandbox": ""},
        {"function": "g", "sandbox": "parser"},
        {"function": "h", "sandbox": "parser"}
      ]},
      {"callsites": [
        {"function": "g", "sandbox": "parser"},
        {"function": "read_key", "sandbox": "parser"}
      ]}
    ]
  }
}"#;

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

fn chain(names: &[&str]) -> CallGraph {
    let mut g = CallGraph::new();
    for w in names.windows(2) {
        g.add_call_by_name(w[0], w[1]);
    }
    g
}

#[test]
fn test_single_vuln_trace_graph() {
    let results = parse_report(REPORT.as_bytes(), |_| {}).unwrap();
    let graph = extract(&results, "vuln").unwrap();

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.call_count(), 2);
    let calls = graph.named_calls();
    assert!(calls.contains(&pair("f", "g")));
    assert!(calls.contains(&pair("g", "h")));

    let h = graph.node_by_name("h").unwrap();
    assert!(h.has_marker(Marker::Vulnerability));
    assert_eq!(h.notes().collect::<Vec<_>>(), vec!["CVE-2014-0160"]);
}

#[test]
fn test_render_three_nodes_two_calls() {
    let results = parse_report(REPORT.as_bytes(), |_| {}).unwrap();
    let graph = extract(&results, "vuln").unwrap();

    let mut out = Vec::new();
    DotExporter.export(&graph, &mut out).unwrap();
    let dot = String::from_utf8(out).unwrap();

    let node_lines: Vec<&str> = dot
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('"') && !l.contains("->"))
        .collect();
    assert_eq!(node_lines.len(), 3);
    assert!(node_lines[0].starts_with("\"f\""));
    assert!(node_lines[1].starts_with("\"g\""));
    assert!(node_lines[2].starts_with("\"h\""));

    let call_lines: Vec<&str> = dot.lines().filter(|l| l.contains("->")).collect();
    assert_eq!(call_lines.len(), 2);
    assert!(call_lines.contains(&"\t\"f\" -> \"g\";"));
    assert!(call_lines.contains(&"\t\"g\" -> \"h\";"));
}

#[test]
fn test_unknown_analysis_yields_no_graph() {
    let results = parse_report(REPORT.as_bytes(), |_| {}).unwrap();
    let result = extract(&results, "capabilities");
    assert!(matches!(result, Err(Error::UnsupportedAnalysis { .. })));
}

#[test]
fn test_analyses_enumerable_without_results() {
    let names: Vec<&str> = Analysis::names().collect();
    assert!(names.contains(&"vuln"));
    assert!(names.contains(&"privaccess"));
}

#[test]
fn test_merge_vuln_and_private_access() {
    let results = parse_report(REPORT.as_bytes(), |_| {}).unwrap();
    let graph = extract_all(&results, &[Analysis::Vulnerabilities, Analysis::PrivateAccess]).unwrap();

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.call_count(), 3);
    assert!(graph.named_calls().contains(&pair("g", "read_key")));
    assert_eq!(
        graph.node_by_name("read_key").unwrap().kind(),
        NodeKind::PrivateAccess
    );
    assert_eq!(graph.node_by_name("h").unwrap().kind(), NodeKind::Vulnerable);
    assert!(graph.validate().is_ok());
}

#[test]
fn test_merge_scenario_fg_gh() {
    let mut a = chain(&["f", "g"]);
    let b = chain(&["g", "h"]);
    a.union(&b).unwrap();

    let names: Vec<String> = a.nodes().map(|(_, n)| n.name.clone()).collect();
    assert_eq!(names, vec!["f", "g", "h"]);
    assert_eq!(
        a.named_calls().into_iter().collect::<Vec<_>>(),
        vec![pair("f", "g"), pair("g", "h")]
    );
}

#[test]
fn test_union_no_duplicate_names_and_no_dangling_calls() {
    let results = parse_report(REPORT.as_bytes(), |_| {}).unwrap();
    let mut merged = Analysis::Vulnerabilities.extract(&results);
    merged.union(&Analysis::PrivateAccess.extract(&results)).unwrap();
    merged.union(&chain(&["main", "f", "g"])).unwrap();

    let mut names: Vec<&str> = merged.nodes().map(|(_, n)| n.name.as_str()).collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before);

    for call in merged.calls() {
        assert!(merged.node(call.caller).is_some());
        assert!(merged.node(call.callee).is_some());
    }
}

#[test]
fn test_repeated_unions_are_identical() {
    let results = parse_report(REPORT.as_bytes(), |_| {}).unwrap();
    let vuln = Analysis::Vulnerabilities.extract(&results);
    let priv_access = Analysis::PrivateAccess.extract(&results);

    let build = || {
        let mut g = vuln.clone();
        g.union(&priv_access).unwrap();
        DotExporter::to_dot(&g).unwrap()
    };
    assert_eq!(build(), build());
}
