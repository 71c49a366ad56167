mod common;

use catalog_probe::browser::LaunchSettings;
use catalog_probe::config::Config;
use catalog_probe::infrastructure::ChromiumRenderer;
use catalog_probe::utils::logging;
use catalog_probe::{
    App, AppError, OutcomeKind, ProbeCtx, ProbeSession, ProbeSettings, Renderer, RunMode, SessionIsolation,
};
use common::{codes, FakeRenderer, Script, MULTIPLE_FRAME, NO_MATCH_FRAME, SITE_ROOT};
use std::path::Path;
use std::sync::Arc;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

fn test_config(mode: RunMode, dir: &Path) -> Config {
    Config {
        mode,
        site_root: SITE_ROOT.to_string(),
        codes_file: dir.join("codes.txt").display().to_string(),
        max_concurrent_probes: 2,
        selector_timeout_ms: 50,
        settle_delay_ms: 0,
        inter_request_delay_ms: 0,
        shutdown_grace_secs: 1,
        results_file: Some(dir.join("results.txt").display().to_string()),
        summary_file: Some(dir.join("summary.txt").display().to_string()),
        ..Config::default()
    }
}

fn scripted() -> FakeRenderer {
    FakeRenderer::builder()
        .script("MULTI", Script::frame(MULTIPLE_FRAME))
        .script("NONE", Script::frame(NO_MATCH_FRAME))
        .script("BROKEN", Script::NavigationFails)
        .script("STATIC", Script::NoFrame)
        .build()
}

#[tokio::test]
async fn test_check_run_writes_results_and_summary() {
    logging::init(false);
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(RunMode::Check, dir.path());
    let renderer = scripted();

    let app = assert_ok!(App::with_renderer(config, Arc::new(renderer.clone())));
    let results = assert_ok!(
        app.run_codes(codes(&["ONE", "MULTI", "NONE", "BROKEN", "STATIC"]), CancellationToken::new())
            .await
    );

    assert_eq!(results.len(), 5);
    assert_eq!(results.tally.found(), 2);
    assert_eq!(results.tally.not_found(), 2);
    assert_eq!(results.tally.count(OutcomeKind::Error), 1);

    // 结果文件按完成顺序写入，内容与结果集一致
    let written = std::fs::read_to_string(dir.path().join("results.txt")).unwrap();
    let mut lines: Vec<&str> = written.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "BROKEN: ERROR - 导航到 https://catalog.test/BROKEN 失败: net::ERR_NAME_NOT_RESOLVED",
            "MULTI: FOUND",
            "NONE: NOT FOUND",
            "ONE: FOUND",
            "STATIC: NOT FOUND",
        ]
    );

    let summary = std::fs::read_to_string(dir.path().join("summary.txt")).unwrap();
    assert!(summary.starts_with("CODE CHECK RESULTS\n"));
    let ones = summary.find("ONE: FOUND").unwrap();
    let statics = summary.find("STATIC: NOT FOUND").unwrap();
    assert!(ones < statics, "汇总按提交顺序排列");
    assert!(summary.contains("Total codes checked: 5\n"));
    assert!(summary.contains("Found: 2\n"));
    assert!(summary.contains("Not found: 2\n"));
    assert!(summary.contains("Errors: 1\n"));

    assert_eq!(renderer.opened(), renderer.closed());
}

#[tokio::test]
async fn test_analyze_run_is_sequential_and_detailed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(RunMode::Analyze, dir.path());
    config.max_concurrent_probes = 8;
    let renderer = scripted();

    let app = assert_ok!(App::with_renderer(config, Arc::new(renderer.clone())));
    let results = assert_ok!(
        app.run_codes(codes(&["ONE", "MULTI", "NONE", "STATIC"]), CancellationToken::new())
            .await
    );

    assert_eq!(renderer.max_active(), 1);
    assert_eq!(results.tally.count(OutcomeKind::Single), 1);
    assert_eq!(results.tally.count(OutcomeKind::Multiple), 1);
    assert_eq!(results.tally.static_html_only(), 2);

    let written = std::fs::read_to_string(dir.path().join("results.txt")).unwrap();
    assert_eq!(
        written,
        "[SINGLE] ONE: Single product found in iframe (Products: 1)\n\
         [MULTIPLE] MULTI: Multiple products found in iframe (Products: 2)\n\
         [STATIC_HTML] NONE: Iframe contains no product indicators - only checking static HTML (Products: 0)\n\
         [STATIC_HTML] STATIC: Iframe not found - only checking static HTML (Products: 0)\n"
    );

    let summary = std::fs::read_to_string(dir.path().join("summary.txt")).unwrap();
    assert!(summary.starts_with("CODE ANALYSIS RESULTS\n"));
    assert!(summary.contains("Total codes analyzed: 4\n"));
    assert!(summary.contains("Static HTML only: 2\n"));
}

#[tokio::test]
async fn test_run_reads_codes_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("codes.txt"),
        "ONE\n\nProcessing: ONE\n  NONE  \n",
    )
    .unwrap();
    let config = test_config(RunMode::Check, dir.path());

    let app = assert_ok!(App::with_renderer(config, Arc::new(scripted())));
    let results = assert_ok!(app.run().await);

    let order: Vec<&str> = results.outcomes.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(order, vec!["ONE", "NONE"]);
}

#[tokio::test]
async fn test_missing_codes_file_fails_before_probing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(RunMode::Check, dir.path());
    let renderer = scripted();

    let app = assert_ok!(App::with_renderer(config, Arc::new(renderer.clone())));
    let err = app.run().await.unwrap_err();

    assert!(matches!(err, AppError::Input { .. }));
    assert_eq!(renderer.opened(), 0);
}

#[tokio::test]
async fn test_unwritable_results_file_fails_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(RunMode::Check, dir.path());
    config.results_file = Some(dir.path().join("missing").join("results.txt").display().to_string());

    let result = App::with_renderer(config, Arc::new(scripted()));
    assert!(matches!(result, Err(AppError::Output { .. })));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_results_write_failure_is_reported_after_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(RunMode::Check, dir.path());
    // 打开成功，但每次写入都返回 ENOSPC
    config.results_file = Some("/dev/full".to_string());
    let renderer = scripted();

    let app = assert_ok!(App::with_renderer(config, Arc::new(renderer.clone())));
    let result = app
        .run_codes(codes(&["ONE", "NONE", "BROKEN"]), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(AppError::Output { .. })));
    // 写入失败后仍然探测了全部编号
    assert_eq!(renderer.navigations().len(), 3);

    let summary = std::fs::read_to_string(dir.path().join("summary.txt")).unwrap();
    assert!(summary.contains("ONE: FOUND\n"));
    assert!(summary.contains("NONE: NOT FOUND\n"));
    assert!(summary.contains("Total codes checked: 3\n"));
    assert!(summary.contains("Errors: 1\n"));
}

#[tokio::test]
async fn test_interrupted_run_still_writes_summary() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(RunMode::Check, dir.path());
    config.max_concurrent_probes = 1;
    config.shutdown_grace_secs = 0;
    let renderer = FakeRenderer::builder()
        .default_script(Script::slow(10_000, Script::NoFrame))
        .build();

    let app = assert_ok!(App::with_renderer(config, Arc::new(renderer)));
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let results = assert_ok!(app.run_codes(codes(&["a", "b"]), shutdown).await);

    assert_eq!(results.len(), 2);
    assert_eq!(results.tally.count(OutcomeKind::Error), 2);
    let summary = std::fs::read_to_string(dir.path().join("summary.txt")).unwrap();
    assert!(summary.contains("Errors: 2\n"));
}

// 以下测试需要本机安装 Chrome 并能访问真实站点

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_probe_isolated_browser() {
    logging::init(true);

    let config = Config::from_env().expect("读取配置失败");
    let renderer = ChromiumRenderer::new(SessionIsolation::Isolated, LaunchSettings::default(), config.browser_debug_port);
    let settings = ProbeSettings::from_config(&config);

    let ctx = ProbeCtx::new(0, "ZZZZNOTACODE", 1);
    let outcome = ProbeSession::new(&renderer, &settings)
        .run(&ctx)
        .await
        .expect("创建浏览器会话失败");

    println!("{:?}", outcome);
    assert!(!outcome.is_error(), "探测不应失败: {}", outcome.detail);
}

#[tokio::test]
#[ignore]
async fn test_live_shared_browser_sessions() {
    logging::init(true);

    let mut config = Config::from_env().expect("读取配置失败");
    config.mode = RunMode::Analyze;
    config.settle_delay_ms = 500;
    let renderer = ChromiumRenderer::new(SessionIsolation::Shared, LaunchSettings::default(), config.browser_debug_port);
    let settings = ProbeSettings::from_config(&config);

    for (i, code) in ["ZZZZNOTACODE", "ZZZZNOTACODE2"].iter().enumerate() {
        let ctx = ProbeCtx::new(i, *code, 2);
        let result = ProbeSession::new(&renderer, &settings).run(&ctx).await;
        assert!(result.is_ok(), "应该能够在共享浏览器中打开会话");
    }
    renderer.shutdown().await;
}
