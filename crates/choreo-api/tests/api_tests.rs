//! API integration tests.

use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use choreo_api::{create_router, ApiConfig, AppState};

const BOUNDARY: &str = "choreo-test-boundary";

struct TestApp {
    dir: TempDir,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = ApiConfig {
            storage_root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let state = AppState::new(config).await.unwrap();
        Self { dir, state }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone(), None)
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, parts: &[Part<'_>]) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
    }

    /// Upload clips for `user` and return their ids.
    async fn upload_clips(&self, user: &str, names: &[&str]) -> Vec<String> {
        let mut parts: Vec<Part> = names
            .iter()
            .map(|n| Part::File {
                name: "videos",
                filename: n,
                data: b"fake video bytes",
            })
            .collect();
        parts.push(Part::Text {
            name: "userId",
            value: user,
        });

        let (status, body) = self.upload(&parts).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["uploaded"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect()
    }
}

enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: video/mp4\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .upload(&[Part::Text {
            name: "userId",
            value: "alice",
        }])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No files uploaded");
}

#[tokio::test]
async fn test_upload_stores_files_per_user() {
    let app = TestApp::new().await;

    // userId arrives after the files
    let (status, body) = app
        .upload(&[
            Part::File {
                name: "videos",
                filename: "intro.MOV",
                data: b"first clip",
            },
            Part::File {
                name: "videos",
                filename: "verse",
                data: b"second",
            },
            Part::Text {
                name: "userId",
                value: "alice",
            },
        ])
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let uploaded = body["uploaded"].as_array().unwrap();
    assert_eq!(uploaded.len(), 2);

    let first = &uploaded[0];
    let id = first["id"].as_str().unwrap();
    assert_eq!(first["userId"], "alice");
    assert_eq!(first["originalName"], "intro.MOV");
    assert_eq!(first["filename"], format!("{id}.mov"));
    assert_eq!(first["url"], format!("/uploads/alice/{id}.mov"));
    assert_eq!(first["size"], 10);
    assert!(first["uploadedAt"].is_string());
    assert!(uploaded[1]["filename"].as_str().unwrap().ends_with(".mp4"));

    let stored = app.root().join("uploads/alice").join(format!("{id}.mov"));
    assert_eq!(std::fs::read(stored).unwrap(), b"first clip");

    // Nothing left behind in staging
    let staging = app.state.paths.staging_dir();
    assert_eq!(std::fs::read_dir(staging).unwrap().count(), 0);

    let (status, body) = app.get("/api/videos?userId=alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clips"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/videos?userId=bob").await;
    assert!(body["clips"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_defaults_user() {
    let app = TestApp::new().await;
    let (status, body) = app
        .upload(&[Part::File {
            name: "videos",
            filename: "a.mp4",
            data: b"x",
        }])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uploaded"][0]["userId"], "default_user");

    let (_, body) = app.get("/api/videos").await;
    assert_eq!(body["clips"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_too_many_files() {
    let app = TestApp::new().await;
    let parts: Vec<Part> = (0..11)
        .map(|_| Part::File {
            name: "videos",
            filename: "a.mp4",
            data: b"x",
        })
        .collect();

    let (status, _) = app.upload(&parts).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        std::fs::read_dir(app.state.paths.staging_dir()).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_invalid_user_id_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .upload(&[
            Part::File {
                name: "videos",
                filename: "a.mp4",
                data: b"x",
            },
            Part::Text {
                name: "userId",
                value: "../../etc",
            },
        ])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid userId");
}

#[tokio::test]
async fn test_sequence_roundtrip() {
    let app = TestApp::new().await;

    let (status, body) = app.json("POST", "/api/sequence", json!({"userId": "alice"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and sequence required");

    let (status, body) = app
        .json("POST", "/api/sequence", json!({"userId": "alice", "sequence": "a"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and sequence required");

    let (status, body) = app
        .json("POST", "/api/sequence", json!({"sequence": ["a"]}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and sequence required");

    let (status, body) = app
        .json(
            "POST",
            "/api/sequence",
            json!({"userId": "alice", "sequence": ["c2", "c1", "c2"]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "sequence": ["c2", "c1", "c2"]}));

    let (_, body) = app.get("/api/sequence?userId=alice").await;
    assert_eq!(body["sequence"], json!(["c2", "c1", "c2"]));

    let (_, body) = app.get("/api/sequence?userId=bob").await;
    assert_eq!(body["sequence"], json!([]));
}

#[tokio::test]
async fn test_bodiless_posts_get_validation_messages() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/export")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "userId required"}));

    // Form-encoded bodies are not JSON and read as empty
    let (status, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/sequence")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("userId=alice"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and sequence required");

    let (status, body) = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/sequence")
                .header("content-type", "application/json")
                .body(Body::from("{\"userId\": "))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn test_numeric_user_id_is_accepted() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json("POST", "/api/sequence", json!({"userId": 42, "sequence": ["a"]}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = app.get("/api/sequence?userId=42").await;
    assert_eq!(body["sequence"], json!(["a"]));
}

#[tokio::test]
async fn test_failed_upload_leaves_no_files() {
    let app = TestApp::new().await;
    // A directory where the clip table should be makes the table write fail
    std::fs::create_dir_all(app.root().join("data/videos.json")).unwrap();

    let (status, body) = app
        .upload(&[
            Part::File {
                name: "videos",
                filename: "a.mp4",
                data: b"first",
            },
            Part::File {
                name: "videos",
                filename: "b.mp4",
                data: b"second",
            },
            Part::Text {
                name: "userId",
                value: "alice",
            },
        ])
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");

    let user_dir = app.root().join("uploads/alice");
    if user_dir.exists() {
        assert_eq!(std::fs::read_dir(&user_dir).unwrap().count(), 0);
    }
    assert_eq!(
        std::fs::read_dir(app.state.paths.staging_dir()).unwrap().count(),
        0
    );
}

#[tokio::test]
async fn test_timeline_derives_sequence() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/sequence/timeline",
            json!({
                "userId": "alice",
                "clips": [
                    {"id": "t1", "clipId": "late", "startTime": 30, "duration": 10, "trackIndex": 0},
                    {"id": "t2", "clipId": "early", "startTime": 0, "duration": 12, "trackIndex": 1},
                    {"id": "t3", "clipId": "tie", "startTime": 30, "duration": 5, "trackIndex": 0}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["sequence"], json!(["early", "late", "tie"]));
    assert_eq!(body["totalDuration"], 60.0);

    let (_, body) = app.get("/api/sequence?userId=alice").await;
    assert_eq!(body["sequence"], json!(["early", "late", "tie"]));

    let (status, _) = app
        .json(
            "POST",
            "/api/sequence/timeline",
            json!({
                "userId": "alice",
                "clips": [{"id": "t1", "clipId": "a", "startTime": 0, "duration": 1, "trackIndex": 7}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_validation_errors() {
    let app = TestApp::new().await;

    let (status, body) = app.json("POST", "/api/export", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId required");

    let (status, body) = app.json("POST", "/api/export", json!({"userId": "alice"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No sequence found for user");

    let ids = app.upload_clips("alice", &["a.mp4"]).await;
    app.json(
        "POST",
        "/api/sequence",
        json!({"userId": "alice", "sequence": [ids[0], "ghost.mp4"]}),
    )
    .await;

    let (status, body) = app.json("POST", "/api/export", json!({"userId": "alice"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing clip ghost.mp4");

    app.json(
        "POST",
        "/api/sequence",
        json!({"userId": "alice", "sequence": ["../../data/videos.json"]}),
    )
    .await;
    let (status, body) = app.json("POST", "/api/export", json!({"userId": "alice"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing clip ../../data/videos.json");
}

#[tokio::test]
async fn test_delete_clip_cleans_up() {
    let app = TestApp::new().await;
    let ids = app.upload_clips("alice", &["a.mp4", "b.mp4"]).await;

    app.json(
        "POST",
        "/api/sequence",
        json!({"userId": "alice", "sequence": [ids[0], ids[1], ids[0]]}),
    )
    .await;

    let (status, body) = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/videos/{}?userId=alice", ids[0]))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removedFromSequence"], 2);

    let (_, body) = app.get("/api/sequence?userId=alice").await;
    assert_eq!(body["sequence"], json!([ids[1]]));

    let (_, body) = app.get("/api/videos?userId=alice").await;
    assert_eq!(body["clips"].as_array().unwrap().len(), 1);
    assert!(!app
        .root()
        .join("uploads/alice")
        .join(format!("{}.mp4", ids[0]))
        .exists());

    let (status, _) = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/videos/{}?userId=alice", ids[0]))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clip_notes() {
    let app = TestApp::new().await;
    let ids = app.upload_clips("alice", &["a.mp4"]).await;

    let uri = format!("/api/videos/{}/notes", ids[0]);
    let (status, body) = app
        .json("PATCH", &uri, json!({"userId": "alice", "notes": "slow on the turn"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clip"]["notes"], "slow on the turn");

    let (_, body) = app.get("/api/videos?userId=alice").await;
    assert_eq!(body["clips"][0]["notes"], "slow on the turn");

    let (status, body) = app
        .json("PATCH", &uri, json!({"userId": "bob", "notes": "x"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Clip not found");
}

#[tokio::test]
async fn test_phrases() {
    let app = TestApp::new().await;

    let (status, body) = app.json("POST", "/api/phrases", json!({"userId": "alice"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phrase"]["title"], "New phrase");
    let first = body["phrase"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .json("POST", "/api/phrases", json!({"userId": "alice", "title": "Chorus"}))
        .await;
    let second = body["phrase"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["phrase"]["orderIndex"], 1);

    let (status, body) = app
        .json(
            "PATCH",
            &format!("/api/phrases/{first}"),
            json!({"userId": "alice", "notes": "Hit on 8", "videoUrl": "/uploads/alice/x.mp4"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phrase"]["notes"], "Hit on 8");
    assert_eq!(body["phrase"]["title"], "New phrase");

    let (_, body) = app.get("/api/phrases?userId=alice&q=hit").await;
    assert_eq!(body["phrases"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .json(
            "POST",
            "/api/phrases/reorder",
            json!({"userId": "alice", "order": [&second, &first]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phrases"][0]["id"], second.as_str());
    assert_eq!(body["phrases"][1]["orderIndex"], 1);

    let (status, _) = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/phrases/{second}?userId=alice"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/phrases?userId=alice").await;
    assert_eq!(body["phrases"].as_array().unwrap().len(), 1);
    assert_eq!(body["phrases"][0]["orderIndex"], 0);
}

#[tokio::test]
async fn test_projects() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json("POST", "/api/projects", json!({"userId": "alice", "name": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please add a project title before saving.");

    app.json(
        "POST",
        "/api/sequence",
        json!({"userId": "alice", "sequence": ["a", "b", "c"]}),
    )
    .await;

    let (status, body) = app
        .json("POST", "/api/projects", json!({"userId": "alice", "name": "Showcase"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["project"]["clipCount"], 3);

    let (_, body) = app.get("/api/projects?userId=alice").await;
    assert_eq!(body["projects"][0]["name"], "Showcase");
}

#[tokio::test]
async fn test_static_uploads_are_served() {
    let app = TestApp::new().await;
    let (_, body) = app
        .upload(&[
            Part::File {
                name: "videos",
                filename: "a.mp4",
                data: b"playable",
            },
            Part::Text {
                name: "userId",
                value: "alice",
            },
        ])
        .await;
    let url = body["uploaded"][0]["url"].as_str().unwrap().to_string();

    let response = app
        .router()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["cross-origin-resource-policy"],
        "cross-origin"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"playable");

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .uri("/uploads/../data/videos.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::OK);
}

#[cfg(unix)]
mod export_with_fake_ffmpeg {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use choreo_media::{ClipMerger, FfmpegRunner};

    /// Stand-in ffmpeg: fails stream copy when `fail_copy`, fails
    /// everything when `fail_all`, otherwise creates its output file.
    fn fake_ffmpeg(dir: &Path, fail_copy: bool, fail_all: bool) -> PathBuf {
        let script = format!(
            "#!/bin/sh\n\
             for last; do :; done\n\
             if [ {fail_all} = 1 ]; then echo 'Conversion failed!' >&2; exit 1; fi\n\
             case \" $* \" in *' -c copy '*) if [ {fail_copy} = 1 ]; then exit 1; fi;; esac\n\
             printf 'merged' > \"$last\"\n",
            fail_copy = u8::from(fail_copy),
            fail_all = u8::from(fail_all),
        );
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    async fn app_with(fail_copy: bool, fail_all: bool) -> TestApp {
        let mut app = TestApp::new().await;
        let ffmpeg = fake_ffmpeg(app.root(), fail_copy, fail_all);
        app.state = app
            .state
            .clone()
            .with_merger(ClipMerger::new(FfmpegRunner::new().with_binary(ffmpeg)));
        app
    }

    async fn prepare_sequence(app: &TestApp) {
        let ids = app.upload_clips("alice", &["a.mp4", "b.mov"]).await;
        let (status, _) = app
            .json(
                "POST",
                "/api/sequence",
                json!({"userId": "alice", "sequence": [ids[1], ids[0]]}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    fn leftover_lists(app: &TestApp) -> usize {
        std::fs::read_dir(app.state.paths.exports_dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".txt"))
            .count()
    }

    #[tokio::test]
    async fn test_export_stream_copy() {
        let app = app_with(false, false).await;
        prepare_sequence(&app).await;

        let (status, body) = app.json("POST", "/api/export", json!({"userId": "alice"})).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["ok"], true);
        assert_eq!(body["mode"], "copy");
        assert_eq!(body["clipCount"], 2);

        let url = body["exportUrl"].as_str().unwrap();
        assert!(url.starts_with("/exports/choreo_alice_"));
        assert!(url.ends_with(".mp4"));
        assert_eq!(leftover_lists(&app), 0);

        let response = app
            .router()
            .oneshot(Request::builder().uri(url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_export_falls_back_to_reencode() {
        let app = app_with(true, false).await;
        prepare_sequence(&app).await;

        let (status, body) = app.json("POST", "/api/export", json!({"userId": "alice"})).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["mode"], "reencode");
        assert_eq!(leftover_lists(&app), 0);
    }

    #[tokio::test]
    async fn test_export_failure_reports_500() {
        let app = app_with(true, true).await;
        prepare_sequence(&app).await;

        let (status, body) = app.json("POST", "/api/export", json!({"userId": "alice"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Export failed");
        // No list and no half-written export stays behind
        assert_eq!(
            std::fs::read_dir(app.state.paths.exports_dir()).unwrap().count(),
            0
        );
    }
}
