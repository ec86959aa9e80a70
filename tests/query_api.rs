use miette::Result;
use pretty_assertions::assert_eq;
use shor::{ShorTree, WILDCARD};

const NGINX: &str = include_str!("../demos/nginx.shor");

#[test]
fn composition() -> Result<()> {
    let tree: ShorTree = "a:1 b:{ c:2 d:3 }".parse()?;
    let q = tree.query();

    assert_eq!(q.all("b").all("c").to_string(), "[c:2]");
    assert_eq!(q.all("b").at(WILDCARD, -1).to_string(), "[d:3]");
    assert_eq!(q.all("a").all("*").to_string(), "[]");
    assert_eq!(q.all("nope").all("c").to_string(), "[]");
    Ok(())
}

#[test]
fn duplicate_keys_keep_order() -> Result<()> {
    let tree: ShorTree = "x:1 y:0 x:2".parse()?;
    let xs = tree.query().all("x");

    assert_eq!(xs.to_string(), "[x:1 x:2]");
    let values: Vec<_> = xs.nodes().filter_map(|n| n.get::<f64>()).collect();
    assert_eq!(values, vec![1.0, 2.0]);
    assert_eq!(tree.query().first("x").to_string(), "[x:1]");
    assert_eq!(tree.query().last("x").to_string(), "[x:2]");
    Ok(())
}

#[test]
fn positions() -> Result<()> {
    let tree: ShorTree = "n:0 n:1 n:2 n:3 n:4".parse()?;
    let q = tree.query();

    assert_eq!(q.at("n", 2).to_string(), "[n:2]");
    assert_eq!(q.at("n", -2).to_string(), "[n:3]");
    assert_eq!(q.at("n", 5).to_string(), "[]");
    assert_eq!(q.at("n", -6).to_string(), "[]");
    assert_eq!(q.range("n", 1, 3).to_string(), "[n:1 n:2 n:3]");
    assert_eq!(q.range("n", -4, -1).to_string(), "[n:1 n:2 n:3 n:4]");
    assert_eq!(q.range("n", 3, 1).to_string(), "[]");
    assert_eq!(q.range("n", 3, 100).to_string(), "[n:3 n:4]");
    Ok(())
}

#[test]
fn first_and_last_n() -> Result<()> {
    let tree: ShorTree = "n:0 n:1 n:2".parse()?;
    let q = tree.query();

    assert_eq!(q.first_n("n", 2).to_string(), "[n:0 n:1]");
    assert_eq!(q.first_n("n", 10).to_string(), "[n:0 n:1 n:2]");
    assert!(q.first_n("n", 0).is_empty());
    assert!(q.first_n("n", -1).is_empty());

    assert_eq!(q.last_n("n", 2).to_string(), "[n:1 n:2]");
    assert_eq!(q.last_n("n", 10).to_string(), "[n:0 n:1 n:2]");
    assert!(q.last_n("n", 0).is_empty());
    assert!(q.last_n("n", -3).is_empty());
    Ok(())
}

#[test]
fn results_concatenate_per_parent() -> Result<()> {
    let tree: ShorTree = "s: { p: 1 p: 2 } s: { p: 3 } s: { q: 4 }".parse()?;
    let q = tree.query().all("s");

    assert_eq!(q.len(), 3);
    assert_eq!(q.all("p").to_string(), "[p:1 p:2 p:3]");
    assert_eq!(q.last("p").to_string(), "[p:2 p:3]");
    assert_eq!(q.at(WILDCARD, 0).to_string(), "[p:1 p:3 q:4]");
    Ok(())
}

#[test]
fn nginx_walkthrough() -> Result<()> {
    let tree: ShorTree = NGINX.parse()?;
    let q = tree.query();

    assert_eq!(
        q.all("*").all("*").all("").to_string(),
        r#"["index.html" "index.htm" "index.php"]"#
    );
    assert_eq!(
        q.all("http").last_n("include", 2).to_string(),
        r#"[include:"/etc/nginx/proxy.conf" include:"/etc/nginx/fastcgi.conf"]"#
    );
    assert_eq!(q.at("*", 1).to_string(), "[worker_processes:5]");
    assert_eq!(
        q.first("http").at("*", -4).to_string(),
        "[gzip:true]"
    );
    assert_eq!(
        q.first("mail").first("server").all("*").to_string(),
        r#"[listen:143 protocol:"imap" proxy:true]"#
    );
    Ok(())
}

#[test]
fn seeded_from_a_node() -> Result<()> {
    let tree: ShorTree = NGINX.parse()?;
    let mail = tree.query().first("mail").get(0).expect("mail is present");

    assert_eq!(mail.query().all("server").len(), 2);
    assert_eq!(
        tree.query_from(mail.id()).all("server").all("listen").to_string(),
        "[listen:143 listen:110]"
    );
    Ok(())
}
