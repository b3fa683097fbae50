// tests/download_engine_test.rs

mod common;

use common::{test_context, test_context_with_config};
use moodle_dl::{
    config::AppConfig,
    constants,
    downloader::LectureDownloader,
    error::AppError,
    models::Fingerprint,
    store::FingerprintStore,
};
use std::{
    fs,
    io::Write,
    sync::atomic::Ordering,
    thread,
    time::Duration,
};
use tempfile::tempdir;
use url::Url;

const PAGE_PATH: &str = "/mod/folder/view.php?id=5";

fn lecture_page(files: &[&str]) -> String {
    let links: String = files
        .iter()
        .map(|f| format!(r#"<li><a href="/pluginfile.php/9/mod_folder/content/0/{f}?forcedownload=1">{f}</a></li>"#))
        .collect();
    format!(r#"<html><body><a href="/course/view.php?id=1">Back</a><ul>{links}</ul></body></html>"#)
}

fn file_path(name: &str) -> String {
    format!("/pluginfile.php/9/mod_folder/content/0/{name}?forcedownload=1")
}

fn fp(value: &str) -> Fingerprint {
    Fingerprint::from(value.to_string())
}

#[tokio::test]
async fn test_second_pass_downloads_nothing() {
    // --- 1. Arrange ---
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();

    let page_mock = server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["A%20File%20Name.pdf", "notes.pdf"]))
        .expect(2)
        .create_async()
        .await;
    let mut heads = Vec::new();
    let mut gets = Vec::new();
    for (name, etag, body) in [
        ("A%20File%20Name.pdf", "\"e-a\"", "first file"),
        ("notes.pdf", "\"e-b\"", "second file"),
    ] {
        heads.push(
            server
                .mock("HEAD", file_path(name).as_str())
                .with_header("etag", etag)
                .expect(2)
                .create_async()
                .await,
        );
        gets.push(
            server
                .mock("GET", file_path(name).as_str())
                .with_header("etag", etag)
                .with_body(body)
                .expect(1)
                .create_async()
                .await,
        );
    }

    // --- 2. Act: first pass ---
    let (context, reporter) = test_context(&[], 1);
    let downloader = LectureDownloader::new(context.clone());
    let total = downloader.download_all(dest.path(), &page_url, 0).await.unwrap();

    // --- 3. Assert ---
    assert_eq!(total, 2);
    assert_eq!(
        reporter.lines(),
        [
            "(1/2) Downloading: A File Name.pdf",
            "(2/2) Downloading: notes.pdf"
        ]
    );
    assert_eq!(fs::read_to_string(dest.path().join("A File Name.pdf")).unwrap(), "first file");
    assert_eq!(fs::read_to_string(dest.path().join("notes.pdf")).unwrap(), "second file");

    // --- 4. Act: second pass over the unchanged page ---
    let (context, reporter) = test_context(&[], 1);
    let total = LectureDownloader::new(context.clone())
        .download_all(dest.path(), &page_url, 2)
        .await
        .unwrap();

    assert_eq!(total, 2);
    assert_eq!(
        reporter.lines(),
        [
            "(1/2) File already downloaded! Skipping: A File Name.pdf",
            "(2/2) File already downloaded! Skipping: notes.pdf"
        ]
    );
    assert_eq!(context.manager.get_stats().skipped, 2);

    page_mock.assert_async().await;
    for mock in heads.iter().chain(gets.iter()) {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_changed_fingerprint_is_downloaded_again() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();

    // previous run stored "v1" and left the file behind
    fs::write(dest.path().join("slides.pdf"), "old content").unwrap();
    let mut store = FingerprintStore::open(dest.path()).unwrap();
    store.add(&fp("\"v1\""));
    store.close().unwrap();

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["slides.pdf"]))
        .create_async()
        .await;
    server
        .mock("HEAD", file_path("slides.pdf").as_str())
        .with_header("etag", "\"v2\"")
        .create_async()
        .await;
    let get = server
        .mock("GET", file_path("slides.pdf").as_str())
        .with_body("new content")
        .expect(1)
        .create_async()
        .await;

    let (context, reporter) = test_context(&[], 1);
    let total = LectureDownloader::new(context)
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(reporter.lines(), ["(1/1) File already exists! Overwriting: slides.pdf"]);
    assert_eq!(fs::read_to_string(dest.path().join("slides.pdf")).unwrap(), "new content");
    let store = FingerprintStore::open(dest.path()).unwrap();
    assert!(store.contains(&fp("\"v1\"")));
    assert!(store.contains(&fp("\"v2\"")));
    get.assert_async().await;
}

#[tokio::test]
async fn test_running_total_accumulates_across_pages() {
    let mut server = mockito::Server::new_async().await;
    let week1 = tempdir().unwrap();
    let week2 = tempdir().unwrap();

    // two files of the first page and two of the second were fetched by an earlier run
    for (dir, known) in [(&week1, ["\"k1\"", "\"k2\""]), (&week2, ["\"k3\"", "\"k4\""])] {
        let mut store = FingerprintStore::open(dir.path()).unwrap();
        for etag in known {
            store.add(&fp(etag));
        }
        store.close().unwrap();
    }

    let pages = [
        ("/mod/folder/view.php?id=1", vec![("a1.pdf", "\"k1\""), ("a2.pdf", "\"n1\""), ("a3.pdf", "\"k2\""), ("a4.pdf", "\"n2\""), ("a5.pdf", "\"n3\"")]),
        ("/mod/folder/view.php?id=2", vec![("b1.pdf", "\"n4\""), ("b2.pdf", "\"k3\""), ("b3.pdf", "\"k4\""), ("b4.pdf", "\"n5\"")]),
    ];
    let mut mocks = Vec::new();
    for (path, files) in &pages {
        let names: Vec<&str> = files.iter().map(|(name, _)| *name).collect();
        mocks.push(
            server
                .mock("GET", *path)
                .with_body(lecture_page(&names))
                .create_async()
                .await,
        );
        for (name, etag) in files {
            mocks.push(
                server
                    .mock("HEAD", file_path(name).as_str())
                    .with_header("etag", etag)
                    .create_async()
                    .await,
            );
            mocks.push(
                server
                    .mock("GET", file_path(name).as_str())
                    .with_body(*name)
                    .expect(usize::from(etag.starts_with("\"n")))
                    .create_async()
                    .await,
            );
        }
    }

    let (context, reporter) = test_context(&[], 1);
    let downloader = LectureDownloader::new(context.clone());
    let page1 = Url::parse(&format!("{}{}", server.url(), pages[0].0)).unwrap();
    let page2 = Url::parse(&format!("{}{}", server.url(), pages[1].0)).unwrap();

    let total = downloader.download_all(week1.path(), &page1, 0).await.unwrap();
    assert_eq!(total, 3);
    let total = downloader.download_all(week2.path(), &page2, total).await.unwrap();
    assert_eq!(total, 5);

    assert_eq!(
        reporter.lines(),
        [
            "(1/5) File already downloaded! Skipping: a1.pdf",
            "(2/5) Downloading: a2.pdf",
            "(3/5) File already downloaded! Skipping: a3.pdf",
            "(4/5) Downloading: a4.pdf",
            "(5/5) Downloading: a5.pdf",
            "(1/4) Downloading: b1.pdf",
            "(2/4) File already downloaded! Skipping: b2.pdf",
            "(3/4) File already downloaded! Skipping: b3.pdf",
            "(4/4) Downloading: b4.pdf"
        ]
    );
    assert!(!week1.path().join("a1.pdf").exists());
    assert_eq!(context.manager.get_stats().success, 5);
    for mock in &mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_missing_etag_falls_back_to_file_existence() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();
    fs::write(dest.path().join("present.pdf"), "kept").unwrap();

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["present.pdf", "absent.pdf"]))
        .create_async()
        .await;
    for name in ["present.pdf", "absent.pdf"] {
        server
            .mock("HEAD", file_path(name).as_str())
            .create_async()
            .await;
    }
    let present_get = server
        .mock("GET", file_path("present.pdf").as_str())
        .with_body("server copy")
        .expect(0)
        .create_async()
        .await;
    let absent_get = server
        .mock("GET", file_path("absent.pdf").as_str())
        .with_body("fresh")
        .expect(1)
        .create_async()
        .await;

    let (context, reporter) = test_context(&[], 1);
    let total = LectureDownloader::new(context.clone())
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(
        reporter.lines(),
        [
            "(1/2) File already exists! Skipping: present.pdf",
            "(2/2) Downloading: absent.pdf"
        ]
    );
    assert_eq!(fs::read_to_string(dest.path().join("present.pdf")).unwrap(), "kept");
    assert!(FingerprintStore::open(dest.path()).unwrap().is_empty());
    present_get.assert_async().await;
    absent_get.assert_async().await;
}

#[tokio::test]
async fn test_force_redownload_overwrites() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();
    fs::write(dest.path().join("a.pdf"), "stale").unwrap();
    let mut store = FingerprintStore::open(dest.path()).unwrap();
    store.add(&fp("\"same\""));
    store.close().unwrap();

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["a.pdf"]))
        .create_async()
        .await;
    server
        .mock("HEAD", file_path("a.pdf").as_str())
        .with_header("etag", "\"same\"")
        .create_async()
        .await;
    let get = server
        .mock("GET", file_path("a.pdf").as_str())
        .with_body("fresh")
        .expect(1)
        .create_async()
        .await;

    let (context, reporter) = test_context(&["--force-redownload"], 1);
    let total = LectureDownloader::new(context)
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(reporter.lines(), ["(1/1) File already exists! Overwriting: a.pdf"]);
    assert_eq!(fs::read_to_string(dest.path().join("a.pdf")).unwrap(), "fresh");
    get.assert_async().await;
}

#[tokio::test]
async fn test_failed_download_releases_its_fingerprint() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["broken.pdf", "ok.pdf"]))
        .create_async()
        .await;
    server
        .mock("HEAD", file_path("broken.pdf").as_str())
        .with_header("etag", "\"b\"")
        .create_async()
        .await;
    server
        .mock("GET", file_path("broken.pdf").as_str())
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("HEAD", file_path("ok.pdf").as_str())
        .with_header("etag", "\"o\"")
        .create_async()
        .await;
    server
        .mock("GET", file_path("ok.pdf").as_str())
        .with_body("fine")
        .create_async()
        .await;

    let (context, _reporter) = test_context(&[], 1);
    let total = LectureDownloader::new(context.clone())
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap();

    assert_eq!(total, 1);
    let stats = context.manager.get_stats();
    assert_eq!((stats.success, stats.failed), (1, 1));

    let store = FingerprintStore::open(dest.path()).unwrap();
    assert!(!store.contains(&fp("\"b\"")));
    assert!(store.contains(&fp("\"o\"")));

    let mut names: Vec<String> = fs::read_dir(dest.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, [constants::FINGERPRINT_STORE_FILE, "ok.pdf"]);
}

#[tokio::test]
async fn test_parallel_workers_keep_document_numbering() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();
    let names = ["p1.pdf", "p2.pdf", "p3.pdf", "p4.pdf"];

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&names))
        .create_async()
        .await;
    for (i, name) in names.iter().enumerate() {
        server
            .mock("HEAD", file_path(name).as_str())
            .with_header("etag", format!("\"p{}\"", i).as_str())
            .create_async()
            .await;
        server
            .mock("GET", file_path(name).as_str())
            .with_body(*name)
            .expect(1)
            .create_async()
            .await;
    }

    let (context, reporter) = test_context(&["--workers", "3"], 3);
    let total = LectureDownloader::new(context)
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap();

    assert_eq!(total, 4);
    assert_eq!(
        reporter.sorted_lines(),
        [
            "(1/4) Downloading: p1.pdf",
            "(2/4) Downloading: p2.pdf",
            "(3/4) Downloading: p3.pdf",
            "(4/4) Downloading: p4.pdf"
        ]
    );
    for name in names {
        assert_eq!(fs::read_to_string(dest.path().join(name)).unwrap(), name);
    }
    assert_eq!(FingerprintStore::open(dest.path()).unwrap().len(), 4);
}

#[tokio::test]
async fn test_page_without_files_leaves_directory_untouched() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();
    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&[]))
        .create_async()
        .await;

    let (context, reporter) = test_context(&[], 1);
    let total = LectureDownloader::new(context)
        .download_all(dest.path(), &page_url, 7)
        .await
        .unwrap();

    assert_eq!(total, 7);
    assert!(reporter.lines().is_empty());
    assert!(!dest.path().join(constants::FINGERPRINT_STORE_FILE).exists());
}

#[tokio::test]
async fn test_unreachable_lecture_page_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();
    server
        .mock("GET", PAGE_PATH)
        .with_status(404)
        .create_async()
        .await;

    let (context, _reporter) = test_context(&[], 1);
    let err = LectureDownloader::new(context)
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap_err();

    assert!(err.is_transport(), "unexpected error: {:?}", err);
    assert!(!matches!(err, AppError::Store { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_body_outlasts_request_timeout() {
    // --- 1. Arrange: about 2.5s of steady transfer against a 1s timeout ---
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["recording.mp4"]))
        .create_async()
        .await;
    server
        .mock("HEAD", file_path("recording.mp4").as_str())
        .with_header("etag", "\"rec\"")
        .create_async()
        .await;
    server
        .mock("GET", file_path("recording.mp4").as_str())
        .with_chunked_body(|w| {
            for _ in 0..6 {
                w.write_all(&[b'x'; 1024])?;
                w.flush()?;
                thread::sleep(Duration::from_millis(400));
            }
            Ok(())
        })
        .create_async()
        .await;

    let config = AppConfig {
        timeout: Duration::from_secs(1),
        ..AppConfig::default()
    };
    let (context, _reporter) = test_context_with_config(&[], config);

    // --- 2. Act ---
    let total = LectureDownloader::new(context.clone())
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap();

    // --- 3. Assert ---
    assert_eq!(total, 1);
    assert_eq!(context.manager.get_stats().failed, 0);
    assert_eq!(fs::metadata(dest.path().join("recording.mp4")).unwrap().len(), 6 * 1024);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_download_leaves_no_partial_file() {
    // --- 1. Arrange: the flag flips after the first chunk has been sent ---
    let mut server = mockito::Server::new_async().await;
    let page_url = Url::parse(&format!("{}{}", server.url(), PAGE_PATH)).unwrap();
    let dest = tempdir().unwrap();
    let (context, _reporter) = test_context(&[], 1);

    server
        .mock("GET", PAGE_PATH)
        .with_body(lecture_page(&["long.mp4"]))
        .create_async()
        .await;
    server
        .mock("HEAD", file_path("long.mp4").as_str())
        .with_header("etag", "\"long\"")
        .create_async()
        .await;
    let token = context.cancellation_token.clone();
    server
        .mock("GET", file_path("long.mp4").as_str())
        .with_chunked_body(move |w| {
            w.write_all(&[b'x'; 1024])?;
            w.flush()?;
            token.store(true, Ordering::Relaxed);
            for _ in 0..5 {
                thread::sleep(Duration::from_millis(200));
                w.write_all(&[b'x'; 1024])?;
                w.flush()?;
            }
            Ok(())
        })
        .create_async()
        .await;

    // --- 2. Act ---
    let err = LectureDownloader::new(context.clone())
        .download_all(dest.path(), &page_url, 0)
        .await
        .unwrap_err();

    // --- 3. Assert: no file under its final name, no temp file, claim released ---
    assert!(matches!(err, AppError::UserInterrupt), "unexpected error: {:?}", err);
    let leftovers: Vec<String> = fs::read_dir(dest.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name != constants::FINGERPRINT_STORE_FILE)
        .collect();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
    assert!(!FingerprintStore::open(dest.path()).unwrap().contains(&fp("\"long\"")));
}
