use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use marathon_client::{AlertSink, MutationSite, NotificationApi, NotificationPanel, PanelView};
use marathon_types::{Channel, NotificationKind};

#[derive(Debug, Parser)]
#[command(name = "marathon", about = "Read and manage marathon association notifications")]
pub struct Cli {
    /// Items per page (overrides MARATHON_PAGE_SIZE).
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List one page of a channel.
    List {
        #[arg(long, value_enum, default_value_t = ChannelArg::Global)]
        channel: ChannelArg,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
    },
    /// Show unread badges for both channels (current page only).
    Unread,
    /// Mark one notification read.
    Read {
        id: String,
        #[arg(long = "type", value_enum, default_value_t = KindArg::Global)]
        kind: KindArg,
        /// Do not report failures, as the dropdown does.
        #[arg(long)]
        quiet: bool,
    },
    /// Mark every notification read.
    ReadAll,
    /// Delete one notification.
    Delete { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelArg {
    Global,
    Event,
}

impl From<ChannelArg> for Channel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Global => Channel::Global,
            ChannelArg::Event => Channel::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Global,
    Personal,
}

impl From<KindArg> for NotificationKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Global => NotificationKind::Global,
            KindArg::Personal => NotificationKind::Personal,
        }
    }
}

/// Alerts go to stderr so they never mix with listed output.
pub struct StderrAlertSink;

impl AlertSink for StderrAlertSink {
    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }
}

pub async fn run<A: NotificationApi>(command: Command, panel: &mut NotificationPanel<A>) -> anyhow::Result<()> {
    match command {
        Command::List { channel, page } => {
            panel.select_channel(channel.into());
            panel.set_page(page);
            let view = panel.load().await.context("failed to load notifications")?;
            print_view(&view, panel.page());
        }
        Command::Unread => {
            let view = panel.load().await.context("failed to load notifications")?;
            for channel in Channel::ALL {
                println!("{:<7} {}", channel, view.overview.unread_count(channel));
            }
            println!("{:<7} {}", "total", view.overview.total_unread());
        }
        Command::Read { id, kind, quiet } => {
            let site = if quiet {
                MutationSite::DropdownMarkRead
            } else {
                MutationSite::ListMarkRead
            };
            if let Some(ack) = panel.mark_read(&id, kind.into(), site).await.context("failed to mark as read")? {
                println!("{}", ack.message.unwrap_or_else(|| format!("marked {} read", id)));
            }
        }
        Command::ReadAll => {
            if let Some(ack) = panel.mark_all_read().await.context("failed to mark all as read")? {
                println!("{}", ack.message.unwrap_or_else(|| "all notifications marked read".into()));
            }
        }
        Command::Delete { id } => {
            if let Some(ack) = panel.delete(&id).await {
                println!("{}", ack.message.unwrap_or_else(|| format!("deleted {}", id)));
            }
        }
    }
    Ok(())
}

fn print_view(view: &PanelView, page: u32) {
    let active = view.overview.active;
    println!(
        "{} notifications, page {}/{} ({} unread on this page)",
        active,
        page,
        view.total_pages().max(1),
        view.overview.unread_count(active)
    );
    if view.items.is_empty() {
        println!("  (none)");
        return;
    }
    for item in &view.items {
        let n = &item.notification;
        let marker = if n.unread { "*" } else { " " };
        let when = n
            .delivered_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| n.sent_at.clone());
        println!("{} #{:<4} {}  {}  [{}]", marker, item.number, when, n.title, n.id);
    }
}
