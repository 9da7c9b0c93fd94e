use anyhow::Result;
use httpmock::prelude::*;
use pcblib::core::{ConversionOptions, Target, Variant, VariantSource};
use pcblib::domain::model::RoundingMode;
use pcblib::{BuildEngine, HttpFetcher, IpcTarget, NativeConverter, PcbLibError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

const SAMPLE: &str = include_str!("fixtures/ipc_sample.fpl");

fn ipc_zip() -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file::<_, ()>("ipc7351_nominal.fpl", FileOptions::default())
        .unwrap();
    zip.write_all(SAMPLE.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn source(server: &MockServer, dir: &Path, variant: Variant) -> VariantSource {
    VariantSource {
        variant,
        url: server.url(format!("/ipc7351_{}.zip", variant)),
        archive: dir.join(format!("ipc7351_{}.zip", variant)),
        output: dir.join(variant.default_output()),
    }
}

fn makefile_options(dir: &Path) -> ConversionOptions {
    let centers = dir.join("rounded-center-exceptions");
    std::fs::write(&centers, "QFN\n").unwrap();
    ConversionOptions {
        rounded_center_exceptions: Some(centers),
        courtyard_mm: Some(0.25),
        rounding: RoundingMode::AllButPin1,
        hash_time: true,
        strip_lmn: true,
        ..ConversionOptions::default()
    }
}

#[tokio::test]
async fn test_ipc_target_downloads_once_and_rebuilds_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let zip_mock = server.mock(|when, then| {
        when.method(GET).path("/ipc7351_nominal.zip");
        then.status(200).body(ipc_zip());
    });

    let source = source(&server, temp_dir.path(), Variant::Nominal);
    let target = IpcTarget::new(
        source.clone(),
        HttpFetcher::new(),
        Arc::new(NativeConverter),
        makefile_options(temp_dir.path()),
    );

    let report = target.build().await?;
    assert_eq!(report.items, 2);
    assert!(source.archive.exists());

    let sot = std::fs::read_to_string(source.output.join("SOT95P280X145-5.kicad_mod"))?;
    assert!(sot.contains("(pad \"1\" smd rect"));
    assert!(sot.contains("(pad \"2\" smd oval"));
    assert!(sot.contains("\"F.CrtYd\""));

    let qfn = std::fs::read_to_string(source.output.join("QFN50P300X300X80-17.kicad_mod"))?;
    assert!(qfn.contains("(pad \"17\" smd rect (at 0 0)"));
    assert!(qfn.contains("(pad \"2\" smd oval"));

    // 第二次執行：使用快取，且舊檔案會被清除
    std::fs::write(source.output.join("stale.kicad_mod"), "(module stale)")?;
    let report = target.build().await?;
    assert_eq!(report.items, 2);
    assert!(!source.output.join("stale.kicad_mod").exists());
    zip_mock.assert_hits(1);

    // hash-time makes the output reproducible
    let again = std::fs::read_to_string(source.output.join("SOT95P280X145-5.kicad_mod"))?;
    assert_eq!(sot, again);

    Ok(())
}

#[tokio::test]
async fn test_ipc_target_download_failure() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ipc7351_least.zip");
        then.status(404);
    });

    let source = source(&server, temp_dir.path(), Variant::Least);
    let target = IpcTarget::new(
        source.clone(),
        HttpFetcher::new(),
        Arc::new(NativeConverter),
        ConversionOptions::default(),
    );

    let err = target.build().await.unwrap_err();
    assert!(matches!(err, PcbLibError::HttpStatusError { status: 404, .. }));
    assert!(!source.archive.exists());
    assert!(!source.output.exists());

    Ok(())
}

#[tokio::test]
async fn test_engine_builds_all_variants() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let zip_mock = server.mock(|when, then| {
        when.method(GET).path_matches(regex::Regex::new(r"^/ipc7351_\w+\.zip$").unwrap());
        then.status(200).body(ipc_zip());
    });

    let options = makefile_options(temp_dir.path());
    let mut engine = BuildEngine::new();
    for variant in Variant::ALL {
        engine.add_target(Box::new(IpcTarget::new(
            source(&server, temp_dir.path(), variant),
            HttpFetcher::new(),
            Arc::new(NativeConverter),
            options.clone(),
        )));
    }

    let reports = engine.run().await?;

    assert_eq!(reports.len(), 3);
    zip_mock.assert_hits(3);
    for variant in Variant::ALL {
        let output = temp_dir.path().join(variant.default_output());
        assert_eq!(std::fs::read_dir(output)?.count(), 2);
    }

    Ok(())
}
