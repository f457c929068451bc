#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use modcat_core::forge::{ContentFile, Lookup, MockForge, Repository, RepositoryOwner};
use serde_json::{json, Value};

pub const ACCOUNT: &str = "mmrl";

pub fn repository(name: &str, has_issues: bool) -> Repository {
    Repository {
        owner: RepositoryOwner {
            login: ACCOUNT.to_string(),
        },
        name: name.to_string(),
        ssh_url: format!("git@github.com:{ACCOUNT}/{name}.git"),
        clone_url: format!("https://github.com/{ACCOUNT}/{name}.git"),
        html_url: format!("https://github.com/{ACCOUNT}/{name}"),
        has_issues,
    }
}

pub fn raw_url(name: &str, file: &str) -> String {
    format!("https://raw.githubusercontent.com/{ACCOUNT}/{name}/main/{file}")
}

/// What the fake forge knows about one repository.
#[derive(Clone)]
pub struct Fixture {
    pub repository: Repository,
    pub descriptor: Option<String>,
    pub changelog: bool,
    pub license: Option<String>,
    pub funding: Vec<(String, String)>,
    pub homepage: String,
    /// When false the query-language endpoint reports no such repository.
    pub graphql: bool,
}

impl Fixture {
    pub fn new(name: &str) -> Self {
        Self {
            repository: repository(name, false),
            descriptor: None,
            changelog: false,
            license: None,
            funding: Vec::new(),
            homepage: String::new(),
            graphql: true,
        }
    }

    pub fn descriptor(mut self, text: &str) -> Self {
        self.descriptor = Some(text.to_string());
        self
    }

    pub fn changelog(mut self) -> Self {
        self.changelog = true;
        self
    }

    pub fn license(mut self, spdx_id: &str) -> Self {
        self.license = Some(spdx_id.to_string());
        self
    }

    pub fn issues(mut self) -> Self {
        self.repository.has_issues = true;
        self
    }

    pub fn funding(mut self, platform: &str, url: &str) -> Self {
        self.funding.push((platform.to_string(), url.to_string()));
        self
    }

    pub fn homepage(mut self, url: &str) -> Self {
        self.homepage = url.to_string();
        self
    }

    pub fn without_graphql(mut self) -> Self {
        self.graphql = false;
        self
    }

    fn query(&self, selection: &str) -> Option<Value> {
        if !self.graphql {
            return None;
        }
        let links: Vec<Value> = self
            .funding
            .iter()
            .map(|(platform, url)| json!({ "platform": platform, "url": url }))
            .collect();
        if selection.contains("fundingLinks") {
            Some(json!({ "fundingLinks": links }))
        } else if selection.contains("homepageUrl") {
            Some(json!({ "homepageUrl": self.homepage }))
        } else if selection.contains("pushedAt") {
            Some(json!({ "pushedAt": "2024-03-01T10:20:30Z" }))
        } else {
            Some(json!({}))
        }
    }
}

/// A `MockForge` answering every lookup from `fixtures`, listed in order.
pub fn mock_forge(fixtures: Vec<Fixture>) -> MockForge {
    let listing: Vec<Repository> = fixtures.iter().map(|f| f.repository.clone()).collect();
    let by_name: Arc<HashMap<String, Fixture>> = Arc::new(
        fixtures
            .into_iter()
            .map(|f| (f.repository.name.clone(), f))
            .collect(),
    );

    let mut forge = MockForge::new();

    forge
        .expect_list_repositories()
        .returning(move |_| Ok(listing.clone()));

    let fixtures = by_name.clone();
    forge
        .expect_file_text()
        .returning(move |repository: &Repository, path: &str| {
            let text = fixtures
                .get(&repository.name)
                .filter(|_| path == "module.prop")
                .and_then(|f| f.descriptor.clone());
            Ok(match text {
                Some(text) => Lookup::Found(text),
                None => Lookup::NotFound,
            })
        });

    let fixtures = by_name.clone();
    forge
        .expect_file_metadata()
        .returning(move |repository: &Repository, path: &str| {
            let present = fixtures
                .get(&repository.name)
                .is_some_and(|f| f.changelog && path == "changelog.md");
            Ok(if present {
                Lookup::Found(ContentFile {
                    name: path.to_string(),
                    path: path.to_string(),
                    download_url: Some(raw_url(&repository.name, path)),
                })
            } else {
                Lookup::NotFound
            })
        });

    let fixtures = by_name.clone();
    forge
        .expect_license_spdx_id()
        .returning(move |repository: &Repository| {
            Ok(match fixtures.get(&repository.name).and_then(|f| f.license.clone()) {
                Some(spdx_id) => Lookup::Found(spdx_id),
                None => Lookup::NotFound,
            })
        });

    let fixtures = by_name;
    forge
        .expect_query_repository()
        .returning(move |_owner: &str, name: &str, selection: &str| {
            Ok(fixtures.get(name).and_then(|f| f.query(selection)))
        });

    forge
}
