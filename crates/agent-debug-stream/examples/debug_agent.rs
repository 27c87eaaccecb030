use agent_debug_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StreamError> {
    agent_debug_stream::observability::init_observability();

    let client = DebugClient::from_env()?;
    let request = DebugAgentRequest::new(AgentType::Single, "Say hello and call one tool.");
    let mut stream = client.debug_agent(&request, &AuthContext::from_env()).await?;

    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::Message(Emission::Text(text)) => print!("{text}"),
            StreamEvent::Message(Emission::Debug(event)) => {
                println!("[{}] {}", event.kind, event.content.unwrap_or_default());
            }
            StreamEvent::Completed(summary) => {
                println!("\n-- {} emissions", summary.stats.emissions());
            }
            StreamEvent::Error(err) => eprintln!("stream error: {err}"),
        }
    }

    let _ = stream.finish().await?;
    Ok(())
}
