use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::config::Config;
use crate::error::Error;
use crate::github::GithubClient;

/// Encoding sent with every generated blob.
const BLOB_ENCODING: &str = "utf-8";

/// Create one auto-commit on the configured branch.
///
/// Five dependent calls, strictly in order, each feeding its resulting sha
/// into the next:
/// 1. resolve the branch tip,
/// 2. create a blob holding a timestamped message,
/// 3. create a tree with that blob at the configured path, layered on the tip,
/// 4. create a commit whose single parent is the tip,
/// 5. move the branch ref to the new commit.
///
/// Each step runs under a spinner that finishes with the step name and the
/// resulting sha. There is no retry: the first failure aborts the remaining
/// steps and propagates unchanged. Objects already created on the remote
/// (blob, tree) stay behind as orphans in that case.
pub fn cmd_commit(cfg: &Config, client: &GithubClient) -> Result<String, Error> {
    let tip_sha = step(
        "resolving branch tip…",
        || client.branch_tip_sha(&cfg.branch),
        |sha| format!("branch {} is at {sha}", cfg.branch),
    )?;

    let content = blob_content(Local::now());
    let blob_sha = step(
        "creating blob…",
        || client.create_blob(&content, BLOB_ENCODING),
        |sha| format!("blob {sha}"),
    )?;

    // TODO: base_tree is handed the tip *commit* sha, but the trees endpoint
    // documents a *tree* sha. Resolving the tip commit's tree first would add
    // a sixth call; confirm which is intended upstream before changing this.
    let tree_sha = step(
        "creating tree…",
        || client.create_tree(&cfg.file_path, &blob_sha, &tip_sha),
        |sha| format!("tree {sha}"),
    )?;

    let commit_sha = step(
        "creating commit…",
        || client.create_commit(&cfg.commit_message, &tree_sha, &tip_sha),
        |sha| format!("commit {sha}"),
    )?;

    step(
        "updating branch reference…",
        || client.update_ref(&cfg.branch, &commit_sha),
        |_| format!("{} -> {commit_sha}", cfg.branch),
    )?;

    Ok(commit_sha)
}

/// Body of the generated file, stamped with the moment the run reached the
/// blob step.
fn blob_content(now: DateTime<Local>) -> String {
    format!(
        "This is an auto commit from kommitter at {}.",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Run one network call under a spinner labeled `label`; on success the
/// spinner finishes with `done(&result)`, on failure with an err-styled
/// line, and the error is returned untouched.
fn step<T>(
    label: &str,
    call: impl FnOnce() -> Result<T, Error>,
    done: impl FnOnce(&T) -> String,
) -> Result<T, Error> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(label.to_string());
    match call() {
        Ok(v) => {
            pb.set_style(ok_style());
            pb.finish_with_message(done(&v));
            Ok(v)
        }
        Err(e) => {
            pb.set_style(err_style());
            pb.finish_with_message(format!("{label} failed"));
            Err(e)
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap()
}

fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use serde_json::json;

    const TIP: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BLOB: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const TREE: &str = "cccccccccccccccccccccccccccccccccccccccc";
    const COMMIT: &str = "dddddddddddddddddddddddddddddddddddddddd";

    fn test_config() -> Config {
        Config {
            token: "t".into(),
            username: "u".into(),
            repo_name: "r".into(),
            branch: "main".into(),
            file_path: "log.txt".into(),
            commit_message: "auto".into(),
        }
    }

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::with_base_url(&test_config(), &server.base_url()).unwrap()
    }

    #[test]
    fn auto_commit_issues_all_five_calls_and_returns_commit_sha() {
        let server = MockServer::start();
        let branch = server.mock(|when, then| {
            when.method(GET).path("/repos/u/r/branches/main");
            then.status(200).json_body(json!({ "commit": { "sha": TIP } }));
        });
        let blob = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/u/r/git/blobs")
                .json_body_partial(r#"{ "encoding": "utf-8" }"#)
                .body_contains("This is an auto commit from kommitter at");
            then.status(201).json_body(json!({ "sha": BLOB }));
        });
        let tree = server.mock(|when, then| {
            when.method(POST).path("/repos/u/r/git/trees").json_body(json!({
                "base_tree": TIP,
                "tree": [{
                    "path": "log.txt",
                    "mode": "100644",
                    "type": "blob",
                    "sha": BLOB,
                }],
            }));
            then.status(201).json_body(json!({ "sha": TREE }));
        });
        let commit = server.mock(|when, then| {
            when.method(POST).path("/repos/u/r/git/commits").json_body(json!({
                "message": "auto",
                "tree": TREE,
                "parents": [TIP],
            }));
            then.status(201).json_body(json!({ "sha": COMMIT }));
        });
        let ref_update = server.mock(|when, then| {
            when.method(PATCH)
                .path("/repos/u/r/git/refs/heads/main")
                .json_body(json!({ "sha": COMMIT }));
            then.status(200).json_body(json!({ "object": { "sha": COMMIT } }));
        });

        let cfg = test_config();
        let got = cmd_commit(&cfg, &client(&server)).unwrap();

        assert_eq!(got, COMMIT);
        branch.assert();
        blob.assert();
        tree.assert();
        commit.assert();
        ref_update.assert();
    }

    #[test]
    fn missing_branch_stops_before_any_object_is_created() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/u/r/branches/main");
            then.status(404).body(r#"{"message":"Branch not found"}"#);
        });
        let blob = server.mock(|when, then| {
            when.method(POST).path("/repos/u/r/git/blobs");
            then.status(201).json_body(json!({ "sha": BLOB }));
        });

        let cfg = test_config();
        let err = cmd_commit(&cfg, &client(&server)).unwrap_err();

        assert!(matches!(err, Error::NotFound { .. }));
        blob.assert_hits(0);
    }

    #[test]
    fn tree_failure_halts_the_pipeline_midway() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/u/r/branches/main");
            then.status(200).json_body(json!({ "commit": { "sha": TIP } }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/repos/u/r/git/blobs");
            then.status(201).json_body(json!({ "sha": BLOB }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/repos/u/r/git/trees");
            then.status(422).body(r#"{"message":"Validation Failed"}"#);
        });
        let commit = server.mock(|when, then| {
            when.method(POST).path("/repos/u/r/git/commits");
            then.status(201).json_body(json!({ "sha": COMMIT }));
        });
        let ref_update = server.mock(|when, then| {
            when.method(PATCH).path("/repos/u/r/git/refs/heads/main");
            then.status(200).json_body(json!({}));
        });

        let cfg = test_config();
        let err = cmd_commit(&cfg, &client(&server)).unwrap_err();

        assert!(matches!(err, Error::Api { status, .. } if status.as_u16() == 422));
        commit.assert_hits(0);
        ref_update.assert_hits(0);
    }

    #[test]
    fn unreachable_api_halts_at_the_first_step() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let cfg = test_config();
        let client =
            GithubClient::with_base_url(&cfg, &format!("http://127.0.0.1:{port}")).unwrap();

        let err = cmd_commit(&cfg, &client).unwrap_err();

        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn blob_content_embeds_formatted_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            blob_content(now),
            "This is an auto commit from kommitter at 2024-01-02 03:04:05."
        );
    }
}
