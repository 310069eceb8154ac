//! Kafka consumer loop for the verification pipeline
//!
//! The notification service runs this loop for its whole lifetime. Every
//! failure mode is log-and-continue: a bad message or a mail provider outage
//! skips that message and moves on to the next one. Nothing re-queues the
//! failed message; by the time a dispatch fails there is no caller left to
//! surface the error to.

use rdkafka::ClientConfig;
use rdkafka::Message;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;

use crate::core::verification::mailer::Mailer;

/// Build a consumer subscribed to the verification topic
pub fn build_consumer(
    brokers: &str,
    group_id: &str,
    topic: &str,
) -> Result<StreamConsumer, KafkaError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", brokers)
        .set("group.id", group_id)
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", "6000")
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()?;

    consumer.subscribe(&[topic])?;

    Ok(consumer)
}

/// Consume verification messages and send activation emails until shutdown
pub async fn run_mail_loop(consumer: StreamConsumer, mailer: Mailer) {
    loop {
        let message = match consumer.recv().await {
            Ok(message) => message,
            Err(err) => {
                tracing::error!("Failed to read message from Kafka: {}", err);
                continue;
            }
        };

        let email = match message.key().map(String::from_utf8_lossy) {
            Some(email) if !email.is_empty() => email.into_owned(),
            _ => {
                tracing::error!("Skipping verification message without a recipient key");
                continue;
            }
        };

        let token = match message.payload().map(String::from_utf8_lossy) {
            Some(token) if !token.is_empty() => token.into_owned(),
            _ => {
                tracing::error!("Skipping verification message without a token payload");
                continue;
            }
        };

        if let Err(err) = mailer.send_activation(&email, &token).await {
            tracing::error!("Failed to send activation email: {}", err);
            continue;
        }

        tracing::info!("Sent activation email to {}", email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_consumer_validates_config() {
        // Client construction is lazy: no broker connection is attempted yet
        let consumer = build_consumer("localhost:9092", "notification", "account-verification");
        assert!(consumer.is_ok());
    }
}
