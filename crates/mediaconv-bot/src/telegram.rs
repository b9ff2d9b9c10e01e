//! Telegram transport: maps updates onto [`BotService`] and renders replies.

use anyhow::Context;
use async_trait::async_trait;
use mediaconv_processing::ProgressSink;
use std::path::Path;
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use teloxide::utils::command::BotCommands;
use tokio::io::AsyncWriteExt;

use crate::callback::{CallbackAction, ConversionChoice};
use crate::menu::{Menu, WELCOME_TEXT};
use crate::service::{BotService, Delivery, Upload, DOWNLOAD_FAILED_TEXT};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show the main menu")]
    Start,
}

/// Run long polling until Ctrl-C.
pub async fn run(bot: Bot, service: Arc<BotService>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::endpoint(handle_upload)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

pub fn keyboard(menu: Menu) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(menu.rows().into_iter().map(|row| {
        row.into_iter()
            .map(|(label, data)| InlineKeyboardButton::callback(label, data))
            .collect::<Vec<_>>()
    }))
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, WELCOME_TEXT)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard(Menu::Main))
                .await?;
        }
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(chat_id = msg.chat.id.0))]
async fn handle_upload(bot: Bot, msg: Message, service: Arc<BotService>) -> anyhow::Result<()> {
    let Some(upload) = upload_from(&msg) else {
        return Ok(());
    };
    let Some(user_id) = msg.from.as_ref().map(|user| user.id.0) else {
        tracing::debug!("Ignoring upload without a sender");
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if let Err(e) = service.check_upload(&upload) {
        tracing::warn!(error = %e, "Upload refused");
        bot.send_message(chat_id, e.user_message()).await?;
        return Ok(());
    }

    let path = service.input_path(user_id, &upload);
    if let Err(e) = download(&bot, &upload.file_id, &path).await {
        tracing::error!(error = ?e, file_id = %upload.file_id, "Download failed");
        tokio::fs::remove_file(&path).await.ok();
        bot.send_message(chat_id, DOWNLOAD_FAILED_TEXT).await?;
        return Ok(());
    }

    let reply = service.accept_upload(user_id, path, &upload).await;
    bot.send_message(chat_id, reply.text)
        .reply_markup(keyboard(reply.menu))
        .await?;
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    service: Arc<BotService>,
) -> anyhow::Result<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();
    let user_id = q.from.id.0;

    match CallbackAction::parse(data) {
        None => tracing::debug!(data, "Ignoring unknown callback token"),
        Some(CallbackAction::Show(menu)) => {
            edit(&bot, chat_id, message_id, menu.title(), Some(menu)).await;
        }
        Some(CallbackAction::NotAvailable(name)) => {
            let text = format!("🚧 {} is not available yet.", name);
            edit(&bot, chat_id, message_id, &text, Some(Menu::Main)).await;
        }
        Some(CallbackAction::Convert(choice)) => {
            let target = Target {
                user_id,
                chat_id,
                message_id,
            };
            run_conversion(&bot, &service, target, choice).await;
        }
    }
    Ok(())
}

/// Whose file to convert and which menu message to keep updating.
#[derive(Debug, Clone, Copy)]
struct Target {
    user_id: u64,
    chat_id: ChatId,
    message_id: MessageId,
}

#[tracing::instrument(
    skip(bot, service),
    fields(user_id = target.user_id, chat_id = target.chat_id.0)
)]
async fn run_conversion(bot: &Bot, service: &BotService, target: Target, choice: ConversionChoice) {
    let Target {
        user_id,
        chat_id,
        message_id,
    } = target;

    if service.current_file(user_id).await.is_none() {
        edit(bot, chat_id, message_id, &choice.missing_file_text(), None).await;
        return;
    }

    edit(bot, chat_id, message_id, &choice.starting_text(), None).await;
    let progress = ChatProgress {
        bot: bot.clone(),
        chat_id,
        message_id,
        choice,
    };

    match service.convert(user_id, choice, &progress).await {
        Ok(delivery) => {
            let sent = send_delivery(bot, chat_id, &delivery).await;
            service.discard(&delivery).await;
            if let Err(e) = sent {
                tracing::error!(error = ?e, "Failed to send converted file");
                let text = format!("❌ Error during {} conversion!", choice.noun());
                edit(bot, chat_id, message_id, &text, None).await;
            }
        }
        Err(e) => {
            edit(bot, chat_id, message_id, &e.user_message(), None).await;
        }
    }
}

async fn download(bot: &Bot, file_id: &str, path: &Path) -> anyhow::Result<()> {
    let file = bot
        .get_file(file_id.to_string())
        .await
        .context("Failed to look up file")?;
    let mut dst = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    bot.download_file(&file.path, &mut dst)
        .await
        .context("Failed to download file")?;
    finish_download(dst, path).await
}

/// Flush and sync a downloaded file so probing and conversion see all of it.
async fn finish_download(mut dst: tokio::fs::File, path: &Path) -> anyhow::Result<()> {
    dst.flush()
        .await
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    dst.sync_all()
        .await
        .with_context(|| format!("Failed to sync {}", path.display()))?;
    Ok(())
}

/// Photos that Telegram refuses (e.g. ICO) are retried as documents.
async fn send_delivery(bot: &Bot, chat_id: ChatId, delivery: &Delivery) -> anyhow::Result<()> {
    let file = || InputFile::file(delivery.path.clone()).file_name(delivery.file_name.clone());

    if delivery.as_photo {
        match bot
            .send_photo(chat_id, file())
            .caption(delivery.caption.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => tracing::warn!(error = %e, "send_photo failed, sending as document"),
        }
    }

    bot.send_document(chat_id, file())
        .caption(delivery.caption.clone())
        .await?;
    Ok(())
}

/// Edit a menu message, ignoring failures such as "message is not modified".
async fn edit(bot: &Bot, chat_id: ChatId, message_id: MessageId, text: &str, menu: Option<Menu>) {
    let request = bot.edit_message_text(chat_id, message_id, text);
    let result = match menu {
        Some(menu) => request.reply_markup(keyboard(menu)).await,
        None => request.await,
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to edit message");
    }
}

fn upload_from(msg: &Message) -> Option<Upload> {
    if let Some(video) = msg.video() {
        return Some(Upload::video(
            video.file.id.clone(),
            u64::from(video.file.size),
            video.file_name.as_deref(),
        ));
    }
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        let size = u64::from(photo.file.size);
        return Some(Upload::photo(photo.file.id.clone(), size));
    }
    msg.document().map(|doc| {
        Upload::document(
            doc.file.id.clone(),
            u64::from(doc.file.size),
            doc.file_name.as_deref(),
        )
    })
}

/// Reports progress by editing the menu message in place.
struct ChatProgress {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    choice: ConversionChoice,
}

#[async_trait]
impl ProgressSink for ChatProgress {
    async fn report(&self, percent: u8, status: &str) {
        let text = self.choice.progress_text(percent, status);
        if let Err(e) = self
            .bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .await
        {
            tracing::debug!(error = %e, percent, "Progress update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_keyboard_mirrors_menu() {
        let markup = keyboard(Menu::VideoFormats);
        let rows = Menu::VideoFormats.rows();
        assert_eq!(markup.inline_keyboard.len(), rows.len());
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "MP4");
    }

    #[tokio::test]
    async fn test_finished_download_is_complete_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("1_clip.mp4");
        let body = vec![7u8; 256 * 1024];

        let mut dst = tokio::fs::File::create(&path).await.unwrap();
        dst.write_all(&body).await.unwrap();
        finish_download(dst, &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), body);
    }
}
