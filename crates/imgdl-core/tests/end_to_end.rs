//! Integration test: full runs through `Session`, resumed across "processes".

mod common;

use std::path::Path;
use std::sync::Arc;

use common::image_server::{self, Route};
use common::scripted::ScriptedTransport;
use image::ImageFormat;
use imgdl_core::config::ImgdlConfig;
use imgdl_core::fetch::Transport;
use imgdl_core::ledger::{Ledger, OutcomeStatus};
use imgdl_core::Session;
use tempfile::tempdir;

fn config(dir: &Path, urls: &str, explicit_ids: bool) -> ImgdlConfig {
    let list = dir.join("urls.txt");
    std::fs::write(&list, urls).unwrap();
    ImgdlConfig {
        url_list: list,
        output_dir: dir.join("images"),
        use_image_id_in_url_list: explicit_ids,
        concurrent_threads: 4,
        validation_threads: 2,
        thread_surviving_time_secs: 5,
        images_in_one_folder: 100,
        ..ImgdlConfig::default()
    }
}

fn report_text(session: &Session) -> String {
    std::fs::read_to_string(session.layout().report_path()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_resource_is_retried_on_the_next_run() {
    let dir = tempdir().unwrap();
    let urls = "http://h/a.jpg\t1\nhttp://h/b.png\t2\nhttp://h/a.jpg\t3\n";
    let cfg = config(dir.path(), urls, true);
    let transport = Arc::new(
        ScriptedTransport::new()
            .serve("http://h/a.jpg", common::image_bytes(ImageFormat::Jpeg))
            .serve("http://h/b.png", common::image_bytes(ImageFormat::Png)),
    );
    transport.stall("http://h/b.png");

    // Run 1: duplicate URL dropped, 1 succeeds, 2 times out.
    let session = Session::open(cfg.clone()).unwrap();
    assert_eq!(session.catalog().ids().collect::<Vec<_>>(), vec![1, 2]);
    let run = session
        .run(Arc::clone(&transport) as Arc<dyn Transport>, None)
        .await
        .unwrap();
    let download = run.download.unwrap();
    assert_eq!((download.success, download.timeout), (1, 1));
    let ledger = session.read_ledger().unwrap().unwrap();
    assert_eq!(ledger.status(1), Some(OutcomeStatus::Success));
    assert_eq!(ledger.status(2), Some(OutcomeStatus::TimeOut));
    assert_eq!(session.pending(Some(&ledger)).0, vec![2]);
    assert!(report_text(&session).contains("Timeout=1\n"));

    // Run 2 in a fresh session: only 2 is fetched.
    transport.recover("http://h/b.png");
    transport.clear_calls();
    let session = Session::open(cfg.clone()).unwrap();
    session
        .run(Arc::clone(&transport) as Arc<dyn Transport>, None)
        .await
        .unwrap();
    assert_eq!(transport.calls(), vec!["http://h/b.png".to_string()]);
    let ledger = session.read_ledger().unwrap().unwrap();
    assert!(session.pending(Some(&ledger)).0.is_empty());

    assert_eq!(
        report_text(&session),
        "TotalImageProcessed=2\nClaimedSuccess=2\nValidatedSuccess=2\nGeneralError=0\nTimeout=0\n"
    );
    let images = session.layout().output_dir();
    assert!(images.join("0/1.jpg").is_file());
    assert!(images.join("0/2.png").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn torn_ledger_tail_is_refetched() {
    let dir = tempdir().unwrap();
    let mut urls = String::new();
    for i in 0..10 {
        urls.push_str(&format!("http://h/{}.jpg\n", i));
    }
    let cfg = config(dir.path(), &urls, false);
    let session = Session::open(cfg).unwrap();
    let logs = session.layout().log_dir();
    std::fs::create_dir_all(logs).unwrap();
    let mut text = String::new();
    for i in 0..7 {
        text.push_str(&format!("{i}\tSuccess\thttp://h/{i}.jpg\t0/{i}.jpg\n"));
    }
    text.push_str("8\tSuccess\thttp://h/8.jpg\t0/8.jpg\n");
    text.push_str("7\tSucc");
    std::fs::write(session.layout().ledger_path(), text).unwrap();

    let ledger = Ledger::read(&session.layout().ledger_path()).unwrap().unwrap();
    let (pending, _) = session.pending(Some(&ledger));
    assert_eq!(pending, vec![7, 9]);

    // Resume over the torn ledger, then make sure the next load still succeeds.
    let jpeg = common::image_bytes(ImageFormat::Jpeg);
    let images = session.layout().output_dir().join("0");
    std::fs::create_dir_all(&images).unwrap();
    for i in [0, 1, 2, 3, 4, 5, 6, 8] {
        std::fs::write(images.join(format!("{i}.jpg")), &jpeg).unwrap();
    }
    let transport = Arc::new(
        ScriptedTransport::new()
            .serve("http://h/7.jpg", jpeg.clone())
            .serve("http://h/9.jpg", jpeg.clone()),
    );
    let run = session
        .run(Arc::clone(&transport) as Arc<dyn Transport>, None)
        .await
        .unwrap();
    assert_eq!(run.download.unwrap().success, 2);

    let ledger = Ledger::read(&session.layout().ledger_path()).unwrap().unwrap();
    assert_eq!(ledger.rows(), 10, "torn row cut, two rows appended");
    assert_eq!(ledger.status(7), Some(OutcomeStatus::Success));
    assert_eq!(ledger.status(9), Some(OutcomeStatus::Success));
    assert!(session.pending(Some(&ledger)).0.is_empty());
    assert_eq!(run.report.validated_success, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn real_transport_run_against_local_server() {
    let base = image_server::start(vec![
        ("/cat.jpg", Route::Body(common::image_bytes(ImageFormat::Jpeg))),
        ("/render?id=2", Route::Body(common::image_bytes(ImageFormat::Png))),
        ("/fake.png", Route::Body(b"<html>soft 404</html>".to_vec())),
    ]);
    let dir = tempdir().unwrap();
    let urls = format!(
        "; test catalog\n{b}/cat.jpg\n{b}/render?id=2\n{b}/gone.gif\n{b}/fake.png\nnot a url\n",
        b = base
    );
    let session = Session::open(config(dir.path(), &urls, false)).unwrap();
    let transport: Arc<dyn Transport> = Arc::new(session.curl_transport());
    let run = session.run(transport, None).await.unwrap();

    let download = run.download.unwrap();
    assert_eq!(download.processed, 5);
    assert_eq!(download.success, 3);
    assert_eq!(download.error, 1);
    assert_eq!(download.invalid, 1);

    let ledger = session.read_ledger().unwrap().unwrap();
    assert_eq!(ledger.status(0), Some(OutcomeStatus::Success));
    assert_eq!(ledger.status(1), Some(OutcomeStatus::Success));
    assert_eq!(ledger.status(2), Some(OutcomeStatus::FileNotExist));
    assert_eq!(ledger.status(3), Some(OutcomeStatus::ValidationFailed));
    assert_eq!(ledger.status(4), Some(OutcomeStatus::InvalidUrl));
    assert_eq!(ledger.get(1).unwrap().path, Path::new("0/1.png"));

    let images = session.layout().output_dir();
    assert!(images.join("0/1.png").is_file(), "placeholder renamed");
    assert!(!images.join("0/2.gif").exists());
    assert!(!images.join("0/3.png").exists());

    assert_eq!(run.report.claimed_success, 3);
    assert_eq!(run.report.validated_success, 2);
    assert_eq!(run.report.general_error, 3);

    let errors = std::fs::read_to_string(session.layout().error_log_path()).unwrap();
    assert_eq!(errors.lines().count(), 2);

    let list = std::fs::read_to_string(session.layout().file_list_path()).unwrap();
    assert_eq!(list.lines().count(), 2);
    assert!(list.lines().all(|l| Path::new(l).is_absolute()));
}
