use crate::domain::model::TargetReport;
use crate::domain::ports::Target;
use crate::utils::error::Result;
use std::time::Duration;

/// 依序執行所有 target，第一個失敗就停止
#[derive(Default)]
pub struct BuildEngine {
    targets: Vec<Box<dyn Target>>,
}

impl BuildEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, target: Box<dyn Target>) {
        self.targets.push(target);
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name()).collect()
    }

    pub async fn run(&self) -> Result<Vec<TargetReport>> {
        let mut reports = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            tracing::info!("🚀 Building {}", target.name());
            match target.build().await {
                Ok(report) => {
                    tracing::info!(
                        "✅ Built {} ({} items, {:?})",
                        report.name,
                        report.items,
                        report.duration
                    );
                    reports.push(report);
                }
                Err(e) => {
                    tracing::error!("❌ Target {} failed: {}", target.name(), e);
                    return Err(e);
                }
            }
        }

        Ok(reports)
    }

    pub fn total_duration(reports: &[TargetReport]) -> Duration {
        reports.iter().map(|r| r.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PcbLibError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockTarget {
        name: String,
        fail: bool,
        runs: Arc<AtomicUsize>,
    }

    impl MockTarget {
        fn new(name: &str, fail: bool, runs: Arc<AtomicUsize>) -> Box<dyn Target> {
            Box::new(Self {
                name: name.to_string(),
                fail,
                runs,
            })
        }
    }

    #[async_trait]
    impl Target for MockTarget {
        async fn build(&self) -> Result<TargetReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PcbLibError::conversion("boom"));
            }
            Ok(TargetReport {
                name: self.name.clone(),
                output: PathBuf::from(&self.name),
                items: 3,
                duration: Duration::from_millis(5),
            })
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_runs_targets_in_order() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut engine = BuildEngine::new();
        engine.add_target(MockTarget::new("least", false, runs.clone()));
        engine.add_target(MockTarget::new("most", false, runs.clone()));

        let reports = tokio_test::block_on(engine.run()).unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["least", "most"]);
        assert_eq!(BuildEngine::total_duration(&reports), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut engine = BuildEngine::new();
        engine.add_target(MockTarget::new("least", true, runs.clone()));
        engine.add_target(MockTarget::new("most", false, runs.clone()));

        assert!(engine.run().await.is_err());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
