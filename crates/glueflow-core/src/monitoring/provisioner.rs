//! Idempotent setup of the pipeline alarms and audit trail.

use crate::config::{MonitoringConfig, PipelineConfig};
use crate::monitoring::{
    bucket_size_alarm, job_failure_alarm, query_failure_alarm, AlarmDefinition, AlarmService,
    TrailCreation, TrailService,
};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// What `enable_audit_trail` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailOutcome {
    /// Trail was created and logging started
    Created,
    /// Trail was already there; nothing changed
    AlreadyExists,
}

/// Summary of a full provisioning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionReport {
    /// Names of alarms registered, in order
    pub alarms: Vec<String>,
    /// Trail name
    pub trail: String,
    /// Trail outcome
    pub trail_outcome: TrailOutcome,
}

/// Registers the pipeline's alarms and its audit trail.
pub struct MonitoringProvisioner {
    alarms: Arc<dyn AlarmService>,
    trails: Arc<dyn TrailService>,
    actions: Vec<String>,
    actions_enabled: bool,
}

impl MonitoringProvisioner {
    /// Create a provisioner without alarm actions.
    pub fn new(alarms: Arc<dyn AlarmService>, trails: Arc<dyn TrailService>) -> Self {
        Self {
            alarms,
            trails,
            actions: Vec::new(),
            actions_enabled: false,
        }
    }

    /// Notify `actions` when any provisioned alarm fires.
    pub fn with_actions(mut self, actions: Vec<String>, enabled: bool) -> Self {
        self.actions = actions;
        self.actions_enabled = enabled;
        self
    }

    async fn put(&self, alarm: AlarmDefinition) -> Result<String> {
        let alarm = alarm.with_actions(self.actions.clone(), self.actions_enabled);
        self.alarms.put_alarm(&alarm).await?;
        info!(alarm = %alarm.name, "Created alarm");
        Ok(alarm.name)
    }

    /// Alarm on the average size of `bucket` exceeding `threshold_gb`.
    pub async fn create_size_alarm(&self, bucket: &str, threshold_gb: u64) -> Result<String> {
        self.put(bucket_size_alarm(bucket, threshold_gb)).await
    }

    /// Alarm on any failed run of `job_name`.
    pub async fn create_job_failure_alarm(&self, job_name: &str) -> Result<String> {
        self.put(job_failure_alarm(job_name)).await
    }

    /// Alarm on any failed query in `workgroup`.
    pub async fn create_query_failure_alarm(&self, workgroup: &str) -> Result<String> {
        self.put(query_failure_alarm(workgroup)).await
    }

    /// Make sure a multi-region trail named `trail_name` exists and logs.
    ///
    /// An existing trail is left untouched.
    pub async fn enable_audit_trail(
        &self,
        trail_name: &str,
        bucket: &str,
    ) -> Result<TrailOutcome> {
        if self.trails.trail_exists(trail_name).await? {
            info!(trail = %trail_name, "Audit trail already exists");
            return Ok(TrailOutcome::AlreadyExists);
        }

        match self.trails.create_trail(trail_name, bucket, true).await? {
            TrailCreation::AlreadyExists => {
                info!(trail = %trail_name, "Audit trail already exists");
                Ok(TrailOutcome::AlreadyExists)
            }
            TrailCreation::Created => {
                self.trails.start_logging(trail_name).await?;
                info!(trail = %trail_name, bucket = %bucket, "Enabled audit trail");
                Ok(TrailOutcome::Created)
            }
        }
    }

    /// Provision everything the pipeline is monitored with. Stops at the
    /// first failure.
    pub async fn provision_all(
        &self,
        monitoring: &MonitoringConfig,
        pipeline: &PipelineConfig,
    ) -> Result<ProvisionReport> {
        let alarms = vec![
            self.create_size_alarm(&pipeline.raw_bucket, monitoring.bucket_size_threshold_gb)
                .await?,
            self.create_job_failure_alarm(&pipeline.job.name).await?,
            self.create_query_failure_alarm(&monitoring.workgroup).await?,
        ];

        let trail_bucket = monitoring
            .trail_bucket
            .as_deref()
            .unwrap_or(&pipeline.raw_bucket);
        let trail_outcome = self
            .enable_audit_trail(&monitoring.trail_name, trail_bucket)
            .await?;

        Ok(ProvisionReport {
            alarms,
            trail: monitoring.trail_name.clone(),
            trail_outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, MonitoringError};
    use crate::monitoring::BYTES_PER_GB;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeAlarms {
        alarms: Mutex<HashMap<String, AlarmDefinition>>,
        fail: bool,
    }

    #[async_trait]
    impl AlarmService for FakeAlarms {
        async fn put_alarm(&self, alarm: &AlarmDefinition) -> Result<()> {
            if self.fail {
                return Err(MonitoringError::Alarm {
                    name: alarm.name.clone(),
                    message: "AccessDenied".into(),
                }
                .into());
            }
            self.alarms.lock().insert(alarm.name.clone(), alarm.clone());
            Ok(())
        }
    }

    /// Trail registry; `hide_existing` simulates a create race where
    /// `trail_exists` misses a trail that is already there.
    #[derive(Default)]
    struct FakeTrails {
        trails: Mutex<HashMap<String, (String, bool)>>,
        logging: Mutex<Vec<String>>,
        hide_existing: bool,
    }

    #[async_trait]
    impl TrailService for FakeTrails {
        async fn trail_exists(&self, name: &str) -> Result<bool> {
            Ok(!self.hide_existing && self.trails.lock().contains_key(name))
        }

        async fn create_trail(
            &self,
            name: &str,
            bucket: &str,
            multi_region: bool,
        ) -> Result<TrailCreation> {
            let mut trails = self.trails.lock();
            if trails.contains_key(name) {
                return Ok(TrailCreation::AlreadyExists);
            }
            trails.insert(name.to_string(), (bucket.to_string(), multi_region));
            Ok(TrailCreation::Created)
        }

        async fn start_logging(&self, name: &str) -> Result<()> {
            self.logging.lock().push(name.to_string());
            Ok(())
        }
    }

    fn provisioner(alarms: Arc<FakeAlarms>, trails: Arc<FakeTrails>) -> MonitoringProvisioner {
        MonitoringProvisioner::new(alarms, trails)
    }

    #[tokio::test]
    async fn test_create_size_alarm() {
        let alarms = Arc::new(FakeAlarms::default());
        let p = provisioner(alarms.clone(), Arc::new(FakeTrails::default()));

        let name = p.create_size_alarm("raw", 10).await.unwrap();
        assert_eq!(name, "S3-raw-Size-Alarm");

        let stored = alarms.alarms.lock().get(&name).cloned().unwrap();
        assert_eq!(stored.threshold, 10.0 * BYTES_PER_GB);
    }

    #[tokio::test]
    async fn test_alarm_is_upsert() {
        let alarms = Arc::new(FakeAlarms::default());
        let p = provisioner(alarms.clone(), Arc::new(FakeTrails::default()));

        p.create_size_alarm("raw", 10).await.unwrap();
        p.create_size_alarm("raw", 20).await.unwrap();

        let stored = alarms.alarms.lock();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["S3-raw-Size-Alarm"].threshold, 20.0 * BYTES_PER_GB);
    }

    #[tokio::test]
    async fn test_alarm_actions_applied() {
        let alarms = Arc::new(FakeAlarms::default());
        let topic = "arn:aws:sns:us-west-2:123456789012:alerts".to_string();
        let p = provisioner(alarms.clone(), Arc::new(FakeTrails::default()))
            .with_actions(vec![topic.clone()], true);

        p.create_job_failure_alarm("job").await.unwrap();

        let stored = alarms.alarms.lock();
        let alarm = &stored["Glue-job-Failure-Alarm"];
        assert_eq!(alarm.actions, vec![topic]);
        assert!(alarm.actions_enabled);
    }

    #[tokio::test]
    async fn test_alarm_failure_propagates() {
        let alarms = Arc::new(FakeAlarms {
            fail: true,
            ..Default::default()
        });
        let p = provisioner(alarms, Arc::new(FakeTrails::default()));

        let err = p.create_query_failure_alarm("wg").await.unwrap_err();
        assert!(matches!(err, Error::Monitoring(MonitoringError::Alarm { .. })));
    }

    #[tokio::test]
    async fn test_enable_audit_trail_twice() {
        let trails = Arc::new(FakeTrails::default());
        let p = provisioner(Arc::new(FakeAlarms::default()), trails.clone());

        let first = p.enable_audit_trail("trail", "logs").await.unwrap();
        let second = p.enable_audit_trail("trail", "logs").await.unwrap();

        assert_eq!(first, TrailOutcome::Created);
        assert_eq!(second, TrailOutcome::AlreadyExists);
        assert_eq!(trails.trails.lock().len(), 1);
        assert_eq!(trails.trails.lock()["trail"], ("logs".to_string(), true));
        assert_eq!(*trails.logging.lock(), vec!["trail".to_string()]);
    }

    #[tokio::test]
    async fn test_enable_audit_trail_create_race() {
        let trails = Arc::new(FakeTrails {
            hide_existing: true,
            ..Default::default()
        });
        trails
            .trails
            .lock()
            .insert("trail".into(), ("logs".into(), true));
        let p = provisioner(Arc::new(FakeAlarms::default()), trails.clone());

        let outcome = p.enable_audit_trail("trail", "logs").await.unwrap();
        assert_eq!(outcome, TrailOutcome::AlreadyExists);
        assert!(trails.logging.lock().is_empty());
    }

    #[tokio::test]
    async fn test_provision_all() {
        let alarms = Arc::new(FakeAlarms::default());
        let trails = Arc::new(FakeTrails::default());
        let p = provisioner(alarms.clone(), trails.clone());

        let monitoring = MonitoringConfig::default();
        let pipeline = PipelineConfig::default();
        let report = p.provision_all(&monitoring, &pipeline).await.unwrap();

        assert_eq!(
            report.alarms,
            vec![
                "S3-your-raw-bucket-name-Size-Alarm".to_string(),
                "Glue-supplychain-etl-job-Failure-Alarm".to_string(),
                "Athena-supplychain-analytics-wg-QueryFailure-Alarm".to_string(),
            ]
        );
        assert_eq!(report.trail, "supplychain-trail");
        assert_eq!(report.trail_outcome, TrailOutcome::Created);
        assert_eq!(alarms.alarms.lock().len(), 3);
        // Trail bucket falls back to the raw bucket
        assert_eq!(
            trails.trails.lock()["supplychain-trail"].0,
            "your-raw-bucket-name"
        );
    }

    #[tokio::test]
    async fn test_provision_all_stops_at_first_error() {
        let alarms = Arc::new(FakeAlarms {
            fail: true,
            ..Default::default()
        });
        let trails = Arc::new(FakeTrails::default());
        let p = provisioner(alarms, trails.clone());

        let result = p
            .provision_all(&MonitoringConfig::default(), &PipelineConfig::default())
            .await;
        assert!(result.is_err());
        assert!(trails.trails.lock().is_empty());
    }
}
