use super::*;

fn node(id: i64, name: &str, parent_id: Option<i64>, sort_order: i32) -> NodeRecord {
    NodeRecord { id, node_id: id, name: name.into(), parent_id, sort_order }
}

#[test]
fn render_tree_indents_children_in_sort_order() {
    let nodes = vec![
        node(3, "木工工程", Some(1), 2),
        node(1, "装修准备", None, 0),
        node(2, "水电改造", Some(1), 1),
    ];
    assert_eq!(render_tree(&nodes), "装修准备\n  水电改造\n  木工工程\n");
}

#[test]
fn render_tree_empty_is_empty() {
    assert_eq!(render_tree(&[]), "");
}

#[test]
fn format_notice_tags_level() {
    let notice = Notice { level: NoticeLevel::Error, message: "Please sign in first".into() };
    assert_eq!(format_notice(&notice), "[error] Please sign in first");
}

#[test]
fn parses_account_save_with_default_kind() {
    let cli = Cli::try_parse_from(["decor", "account", "save", "--data", "{}"]).unwrap();
    let Command::Account(AccountCommand { command: AccountSubcommand::Save { kind, data } }) = cli.command else {
        panic!("expected account save");
    };
    assert_eq!(kind, "mindmap");
    assert_eq!(data, "{}");
}

#[test]
fn mock_login_requires_password() {
    assert!(Cli::try_parse_from(["decor", "mock", "login", "--username", "demo"]).is_err());
}

#[test]
fn api_client_carries_token_and_base_url() {
    let api = api_client("http://127.0.0.1:8787/api/", Some("mock_jwt_token_1")).unwrap();
    assert_eq!(api.base_url(), "http://127.0.0.1:8787/api");
    assert_eq!(api.authorization().as_deref(), Some("Bearer mock_jwt_token_1"));
}
