use anyhow::Context;
use clap::Parser;
use pcblib::config::cli::{Command, LogFormat};
use pcblib::core::download::LicenseGate;
use pcblib::core::models3d::ModelsTarget;
use pcblib::domain::ports::Converter;
use pcblib::utils::error::{ErrorSeverity, PcbLibError};
use pcblib::utils::{logger, validation::Validate};
use pcblib::{
    BuildConfig, BuildEngine, CliConfig, ConverterBackend, ExternalConverter, HttpFetcher,
    IpcTarget, NativeConverter,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting pcblib");
    tracing::debug!("CLI config: {:?}", cli);

    let mut config = BuildConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if let Command::Convert(args) = &cli.command {
        let options = args.options();
        if cli.dry_run {
            println!("Would convert {} file(s) into {}", args.inputs.len(), args.outdir.display());
            return Ok(());
        }
        let outcome =
            NativeConverter::convert_files(args.inputs.clone(), args.outdir.clone(), options).await;
        match outcome {
            Ok(count) => println!("✅ Wrote {} footprints to {}", count, args.outdir.display()),
            Err(e) => exit_with(e),
        }
        return Ok(());
    }

    if let Command::Ipc(args) = &cli.command {
        args.apply_to(&mut config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine = build_engine(&cli.command, &config);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        for name in engine.target_names() {
            println!("would build: {}", name);
        }
        return Ok(());
    }

    match engine.run().await {
        Ok(reports) => {
            for report in &reports {
                println!(
                    "✅ {}: {} items in {:.1?}",
                    report.output.display(),
                    report.items,
                    report.duration
                );
            }
            tracing::info!(
                "📁 Build finished in {:?}",
                BuildEngine::total_duration(&reports)
            );
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

fn build_engine(command: &Command, config: &BuildConfig) -> BuildEngine {
    let fetcher = HttpFetcher::new();
    let mut engine = BuildEngine::new();

    let with_ipc = matches!(command, Command::All | Command::Ipc(_));
    let with_3d = matches!(command, Command::All | Command::Models3d);

    if with_ipc {
        let converter: Arc<dyn Converter> = match config.converter.backend {
            ConverterBackend::Native => Arc::new(NativeConverter),
            ConverterBackend::External => Arc::new(ExternalConverter::new(
                config.converter.python.clone(),
                config.converter.script.clone(),
                config.converter.fp2kicad.clone(),
            )),
        };
        let options = config.conversion_options();
        let license = LicenseGate::new();
        for source in config.variant_sources() {
            engine.add_target(Box::new(IpcTarget::new(
                source,
                fetcher.clone(),
                converter.clone(),
                options.clone(),
            )
            .with_license_gate(license.clone())));
        }
    }

    if with_3d {
        engine.add_target(Box::new(ModelsTarget::new(
            fetcher,
            config.models3d.index_url.clone(),
            config.models3d.url_base.clone(),
            config.models3d.output.clone(),
        )));
    }

    engine
}

fn exit_with(e: PcbLibError) -> ! {
    tracing::error!(
        "❌ Build failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
