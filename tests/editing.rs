use miette::Result;
use pretty_assertions::assert_eq;
use shor::{EditError, ShorKind, ShorTree, ShorValue};

#[test]
fn set_coerces_kind() -> Result<()> {
    let mut tree: ShorTree = "port: 80".parse()?;
    let port = tree.query().first("port").into_ids()[0];

    assert!(tree.set(port, true));
    assert_eq!(tree.kind(port), Some(ShorKind::Boolean));
    assert_eq!(tree.get::<f64>(port), None);
    assert_eq!(tree.get::<bool>(port), Some(true));
    assert_eq!(tree.to_string(), "port:true");

    assert!(tree.set(port, "eighty"));
    assert_eq!(tree.kind(port), Some(ShorKind::String));
    assert_eq!(
        tree.node(port).and_then(|n| n.literal()).as_deref(),
        Some("eighty")
    );

    assert!(tree.set(port, 8080u16));
    assert_eq!(tree.value(port), Some(&ShorValue::Number(8080.0)));
    Ok(())
}

#[test]
fn set_on_table_drops_children() -> Result<()> {
    let mut tree: ShorTree = "server: { listen: 80 root: \"html\" }".parse()?;
    let server = tree.query().first("server").into_ids()[0];
    let listen = tree.children(server)[0];

    assert!(tree.set(server, "off"));
    assert!(tree.query_from(server).all("*").is_empty());
    assert!(!tree.contains(listen));
    assert_eq!(tree.to_string(), r#"server:"off""#);
    Ok(())
}

#[test]
fn append_insert_remove() -> Result<()> {
    let mut tree: ShorTree = "http: { a: 1 c: 3 }".parse()?;
    let http = tree.query().first("http").into_ids()[0];

    let b = tree.new_leaf("b", 2)?;
    tree.insert(http, b, 1)?;
    let d = tree.new_leaf("d", 4)?;
    tree.append(http, d)?;
    let first = tree.new_leaf("", "first")?;
    tree.insert(http, first, 0)?;
    assert_eq!(tree.to_string(), r#"http:{"first" a:1 b:2 c:3 d:4}"#);

    let c = tree.query().first("http").first("c").into_ids()[0];
    assert!(tree.remove(http, c));
    assert!(!tree.remove(http, c));
    assert_eq!(tree.to_string(), r#"http:{"first" a:1 b:2 d:4}"#);
    assert_eq!(tree.parent(b), Some(http));
    Ok(())
}

#[test]
fn reparenting_requires_a_copy() -> Result<()> {
    let mut tree: ShorTree = "a: { x: 1 } b: {}".parse()?;
    let root = tree.root();
    let a = tree.children(root)[0];
    let b = tree.children(root)[1];

    // Nodes can't change parents; copy instead.
    let x = tree.children(a)[0];
    assert_eq!(tree.append(b, x), Err(EditError::AlreadyAttached(x)));
    let copy = tree.new_leaf("x", tree.get::<f64>(x).unwrap_or_default())?;
    tree.append(b, copy)?;
    assert!(tree.remove(root, a));
    assert_eq!(tree.to_string(), "b:{x:1}");
    Ok(())
}

#[test]
fn edit_errors_are_diagnostics() {
    let mut tree = ShorTree::new();
    let err = tree.new_table("9lives").expect_err("invalid key");
    assert_eq!(err.to_string(), r#""9lives" is not a valid key"#);
    let help = miette::Diagnostic::help(&err).map(|h| h.to_string());
    assert!(help.is_some());
}
