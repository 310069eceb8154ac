//! Kafka producer for the verification pipeline
//!
//! Registration publishes one message per new account: the key is the
//! recipient email, the payload is the verification token. The publish is
//! part of the registration request itself, so a broker failure surfaces to
//! the registering caller instead of being retried in the background.

use std::time::Duration;

use rdkafka::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

/// How long a message may sit in the local queue before delivery fails
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Producer error types
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Kafka client error: {0}")]
    Broker(#[from] KafkaError),

    #[error("Failed to publish verification message: {0}")]
    Delivery(String),
}

/// Producer that feeds the verification mail pipeline
#[derive(Clone)]
pub struct VerificationProducer {
    producer: FutureProducer,
    topic: String,
}

impl VerificationProducer {
    /// Create a producer for the given brokers and topic
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.into(),
        })
    }

    /// Publish one verification message (key = email, payload = token)
    pub async fn publish(&self, email: &str, token: &str) -> Result<(), PublishError> {
        let record = FutureRecord::to(&self.topic).key(email).payload(token);

        self.producer
            .send(record, Timeout::After(PUBLISH_TIMEOUT))
            .await
            .map(|_| ())
            .map_err(|(err, _)| PublishError::Delivery(err.to_string()))
    }
}
