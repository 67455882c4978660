use crate::api::{ChatApi, HttpChatApi, Message};
use crate::config::Config;
use crate::controller::ConversationController;
use anyhow::{bail, Context, Result};

fn connect(config: &Config) -> Result<ConversationController<HttpChatApi>> {
    let api = HttpChatApi::from_config(config).context("Failed to set up API client")?;
    Ok(ConversationController::new(api, config.user_id.clone()))
}

/// Turn a recorded controller error into a command failure.
fn ensure_ok<A: ChatApi>(controller: &ConversationController<A>) -> Result<()> {
    match controller.error() {
        Some(message) => bail!("{}", message),
        None => Ok(()),
    }
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("   (no messages yet)");
        return;
    }

    for message in messages {
        let icon = match message.role.as_str() {
            "user" => "👤",
            "assistant" => "🤖",
            _ => "⚙️",
        };
        println!("{} {}", icon, message.content);
    }
}

pub async fn list_conversations(config: &Config) -> Result<()> {
    let mut controller = connect(config)?;
    list_with(&mut controller).await
}

async fn list_with<A: ChatApi>(controller: &mut ConversationController<A>) -> Result<()> {
    controller.fetch_conversations().await;
    ensure_ok(controller)?;

    if controller.conversations().is_empty() {
        println!("📭 No conversations yet. Run 'chatdeck' to start one!");
        return Ok(());
    }

    println!("💬 Your conversations:");
    println!("{}", "=".repeat(50));
    for conversation in controller.conversations() {
        println!("📋 {}", conversation.title);
        println!("   🆔 {}", conversation.id);
        if let Some(updated) = &conversation.updated_at {
            println!("   🕒 Updated: {}", updated);
        }
    }

    Ok(())
}

pub async fn show_conversation(config: &Config, id: &str) -> Result<()> {
    let mut controller = connect(config)?;
    show_with(&mut controller, id).await
}

async fn show_with<A: ChatApi>(controller: &mut ConversationController<A>, id: &str) -> Result<()> {
    controller.open_conversation(id).await;
    ensure_ok(controller)?;

    let Some(conversation) = controller.current() else {
        bail!("Conversation '{}' has no id", id);
    };
    println!("📋 {}", conversation.title);
    println!("{}", "=".repeat(50));
    print_messages(controller.messages());
    Ok(())
}

pub async fn send_message(config: &Config, content: &str, conversation: Option<&str>) -> Result<()> {
    let mut controller = connect(config)?;
    send_with(&mut controller, content, conversation).await
}

async fn send_with<A: ChatApi>(
    controller: &mut ConversationController<A>,
    content: &str,
    conversation: Option<&str>,
) -> Result<()> {
    if content.trim().is_empty() {
        bail!("Message cannot be empty");
    }

    match conversation {
        Some(id) => {
            controller.open_conversation(id).await;
            ensure_ok(controller)?;
        }
        None => {
            // Title numbering follows the current list length
            controller.fetch_conversations().await;
            ensure_ok(controller)?;
        }
    }

    controller.send_message(content).await;
    ensure_ok(controller)?;

    if let Some(current) = controller.current() {
        println!("📋 {} ({})", current.title, current.id);
    }
    print_messages(controller.messages());
    Ok(())
}

pub async fn add_note(config: &Config, id: &str, content: &str) -> Result<()> {
    let mut controller = connect(config)?;
    controller.open_conversation(id).await;
    ensure_ok(&controller)?;

    controller.append_note(content).await;
    ensure_ok(&controller)?;

    println!("📝 Note added to '{}'", id);
    Ok(())
}

pub async fn delete_conversation(config: &Config, id: &str) -> Result<()> {
    let mut controller = connect(config)?;
    controller.delete_conversation(id).await;
    ensure_ok(&controller)?;

    println!("🗑️  Deleted conversation '{}'", id);
    Ok(())
}

pub async fn health(config: &Config) -> Result<()> {
    let api = HttpChatApi::from_config(config).context("Failed to set up API client")?;
    api.health().await?;
    println!("✅ {} is reachable", config.api_base_url);
    Ok(())
}
