use super::*;

fn node(id: i64, parent_id: Option<i64>, sort_order: i32) -> NodeRecord {
    NodeRecord { id, node_id: id, name: format!("task {id}"), parent_id, sort_order }
}

#[test]
fn node_record_accepts_null_parent() {
    let raw = r#"{"id":1,"node_id":1,"name":"准备","parent_id":null,"sort_order":0}"#;
    let parsed: NodeRecord = serde_json::from_str(raw).unwrap();
    assert_eq!(parsed.parent_id, None);
    assert_eq!(parsed.name, "准备");
}

#[test]
fn children_of_orders_by_sort_order() {
    let nodes = vec![node(1, None, 0), node(3, Some(1), 2), node(2, Some(1), 1), node(4, Some(2), 0)];
    let ids = children_of(&nodes, Some(1))
        .iter()
        .map(|n| n.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn children_of_none_returns_roots() {
    let nodes = vec![node(1, None, 0), node(2, Some(1), 0)];
    let roots = children_of(&nodes, None);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, 1);
}
