use super::*;

#[tokio::test]
async fn list_nodes_returns_seeded_tree_in_order() {
    let Json(nodes) = list_nodes(State(AppState::new())).await;
    assert_eq!(nodes.len(), 5);
    assert_eq!(nodes[0].name, "装修准备");
    assert!(nodes.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
    assert_eq!(nodes[4].name, "油漆工程");
}
