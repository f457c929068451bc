mod common;

use common::{mock_forge, repository, Fixture};
use modcat_core::descriptor::{fetch_descriptor, ModuleDescriptor};
use modcat_core::error::ForgeError;
use modcat_core::forge::MockForge;

struct TestCase {
    name: &'static str,
    text: &'static str,
    expected: Vec<(&'static str, &'static str)>,
}

#[test]
fn parse_descriptor_table_driven() {
    let test_cases = vec![
        TestCase {
            name: "typical module.prop",
            text: "id=zygisk_lsposed\nname=LSPosed\nversion=v1.9.2\nversionCode=7024\n",
            expected: vec![
                ("id", "zygisk_lsposed"),
                ("name", "LSPosed"),
                ("version", "v1.9.2"),
                ("versionCode", "7024"),
            ],
        },
        TestCase {
            name: "lines without separator are ignored",
            text: "# comment\n\nid=foo\njust text\n",
            expected: vec![("id", "foo")],
        },
        TestCase {
            name: "first separator splits, value keeps the rest",
            text: "updateJson=https://example.com/u.json?a=1&b=2\n",
            expected: vec![("updateJson", "https://example.com/u.json?a=1&b=2")],
        },
        TestCase {
            name: "no trimming around key or value",
            text: " id = foo \n",
            expected: vec![(" id ", " foo ")],
        },
        TestCase {
            name: "later duplicate wins in original position",
            text: "id=first\nname=x\nid=second\n",
            expected: vec![("id", "second"), ("name", "x")],
        },
        TestCase {
            name: "crlf line endings",
            text: "id=foo\r\nauthor=bar\r\n",
            expected: vec![("id", "foo"), ("author", "bar")],
        },
        TestCase {
            name: "empty value",
            text: "updateJson=\n",
            expected: vec![("updateJson", "")],
        },
    ];

    for case in test_cases {
        let descriptor = ModuleDescriptor::parse(case.text);
        let pairs: Vec<(&str, &str)> = descriptor.iter().collect();
        assert_eq!(pairs, case.expected, "case: {}", case.name);
    }
}

#[test]
fn well_formed_lines_reserialize_exactly() {
    let text = "id=foo\nname=Foo = Bar\ndescription= spaced value \n";
    let descriptor = ModuleDescriptor::parse(text);
    let reserialized: String = descriptor
        .iter()
        .map(|(k, v)| format!("{k}={v}\n"))
        .collect();
    assert_eq!(reserialized, text);
}

#[test]
fn update_json_requires_non_empty_value() {
    assert_eq!(ModuleDescriptor::parse("id=a\n").update_json(), None);
    assert_eq!(
        ModuleDescriptor::parse("id=a\nupdateJson=\n").update_json(),
        None
    );
    assert_eq!(
        ModuleDescriptor::parse("id=a\nupdateJson=https://x/u.json\n").update_json(),
        Some("https://x/u.json")
    );
}

#[test]
fn id_is_read_from_descriptor() {
    assert_eq!(ModuleDescriptor::parse("id=foo\n").id(), Some("foo"));
    assert_eq!(ModuleDescriptor::parse("name=foo\n").id(), None);
}

#[tokio::test]
async fn fetch_descriptor_returns_none_when_file_is_missing() {
    let forge = mock_forge(vec![Fixture::new("plain")]);
    let repo = repository("plain", false);
    let descriptor = fetch_descriptor(&forge, &repo).await.expect("lookup succeeds");
    assert!(descriptor.is_none());
}

#[tokio::test]
async fn fetch_descriptor_parses_file_contents() {
    let forge = mock_forge(vec![Fixture::new("module").descriptor("id=foo\nversion=1\n")]);
    let repo = repository("module", false);
    let descriptor = fetch_descriptor(&forge, &repo)
        .await
        .expect("lookup succeeds")
        .expect("descriptor present");
    assert_eq!(descriptor.id(), Some("foo"));
    assert_eq!(descriptor.get("version"), Some("1"));
}

#[tokio::test]
async fn fetch_descriptor_propagates_forge_errors() {
    let mut forge = MockForge::new();
    forge.expect_file_text().returning(|_, _| {
        Err(ForgeError::Status {
            url: "https://api.github.com/repos/mmrl/x/contents/module.prop".into(),
            status: 401,
        })
    });
    let repo = repository("x", false);
    let err = fetch_descriptor(&forge, &repo).await.unwrap_err();
    assert!(matches!(err, ForgeError::Status { status: 401, .. }));
}
