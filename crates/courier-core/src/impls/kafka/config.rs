use rdkafka::config::ClientConfig;

use crate::config::KafkaSettings;

/// Base client config shared by the consumer and the dead-letter producer.
pub fn client_config(settings: &KafkaSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &settings.brokers)
        .set("security.protocol", "plaintext");
    config
}
