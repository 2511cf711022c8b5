// Detection service — admission, validation, then the gateway.
//
// A throttled request short-circuits before validation or any backend work.
// The HTTP layer admits in middleware, before the body is read, and then
// calls the `*_admitted` entry points so nothing is counted twice.

use anyhow::Result;

use crate::config::Config;
use crate::detection::gateway::ProviderGateway;
use crate::detection::traits::{DetectionVerdict, Payload};
use crate::error::ServiceError;
use crate::report::DetectionReport;
use crate::throttle::{client_key, Admission, RequestThrottle};
use crate::validate::validate;

pub struct DetectionService {
    throttle: RequestThrottle,
    gateway: ProviderGateway,
}

impl DetectionService {
    pub fn new(throttle: RequestThrottle, gateway: ProviderGateway) -> Self {
        Self { throttle, gateway }
    }

    /// Build the throttle and gateway from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            RequestThrottle::new(config.throttle),
            ProviderGateway::from_selection(&config.backends)?,
        ))
    }

    pub fn gateway(&self) -> &ProviderGateway {
        &self.gateway
    }

    pub fn throttle(&self) -> &RequestThrottle {
        &self.throttle
    }

    /// Count a request against `client`'s window. Callers without an
    /// identity share the fallback throttle key.
    pub fn admit(&self, client: Option<&str>) -> Result<(), ServiceError> {
        match self.throttle.admit(client_key(client)) {
            Admission::Allowed => Ok(()),
            Admission::Rejected => Err(ServiceError::rate_limited()),
        }
    }

    /// Admit, validate, then detect on behalf of `client`.
    pub async fn detect(
        &self,
        payload: Payload<'_>,
        client: Option<&str>,
    ) -> Result<DetectionVerdict, ServiceError> {
        self.admit(client)?;
        self.detect_admitted(payload).await
    }

    /// Validate and detect a request that has already been admitted.
    pub async fn detect_admitted(
        &self,
        payload: Payload<'_>,
    ) -> Result<DetectionVerdict, ServiceError> {
        validate(payload)?;
        self.gateway.detect(payload).await
    }

    /// Detect and shape the public report.
    pub async fn detect_report(
        &self,
        payload: Payload<'_>,
        client: Option<&str>,
    ) -> Result<DetectionReport, ServiceError> {
        self.admit(client)?;
        self.report_admitted(payload).await
    }

    pub async fn report_admitted(
        &self,
        payload: Payload<'_>,
    ) -> Result<DetectionReport, ServiceError> {
        let verdict = self.detect_admitted(payload).await?;
        Ok(DetectionReport::from_verdict(payload.modality(), &verdict))
    }
}
