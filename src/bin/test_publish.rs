use redis_stream_producer::{Message, Producer};

#[tokio::main]
async fn main() {
    // Productor con las opciones por defecto (127.0.0.1:6379, MAXLEN ~ 1000)
    let producer = Producer::new().await.expect("Producer creation error");

    let mut msg = Message::new("test-messages")
        .with_value("uuid", uuid::Uuid::new_v4().to_string())
        .with_value("sent_at", chrono::Utc::now().to_rfc3339())
        .with_value("payload", b"test message".to_vec());

    match producer.enqueue(&mut msg).await {
        Ok(()) => {
            println!(
                "✅ Mensaje enviado exitosamente a {} con ID {}",
                msg.stream,
                msg.id.unwrap_or_default()
            );
        }
        Err(e) => {
            eprintln!("❌ Error enviando mensaje: {}", e);
        }
    }
}
