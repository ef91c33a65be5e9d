use anyhow::{Context as _, Result};
use dn7x7_core::models::{NewsQuery, NewsSummary};
use dn7x7_core::NewsClient;

use crate::cli::NewsCommand;
use crate::context::Context;
use crate::format::{format_date, print_json, strip_html, truncate_string};

pub async fn run(ctx: &mut Context, api_key: &str, command: NewsCommand) -> Result<()> {
    let news = NewsClient::new(&ctx.base_url(), api_key).context("Failed to create news client")?;

    match command {
        NewsCommand::List {
            category,
            page,
            page_size,
        } => {
            let query = NewsQuery {
                category,
                page,
                page_size,
            };
            let page = news.list(&query).await?;
            if ctx.json {
                return print_json(&page);
            }
            print_summaries(&page.results);
            println!(
                "\nPage {} of {} ({} articles)",
                page.page, page.total_pages, page.count
            );
            if page.has_next() {
                println!("Next: --page {}", page.page + 1);
            }
        }
        NewsCommand::Get { id } => {
            let article = news.get_article(id).await?;
            if ctx.json {
                return print_json(&article);
            }
            println!("{}", article.title);
            println!("{} | {}", format_date(&article.published_at), article.categories.join(", "));
            println!("{}\n", article.url);
            println!("{}", strip_html(&article.content));
        }
    }
    Ok(())
}

fn print_summaries(summaries: &[NewsSummary]) {
    if summaries.is_empty() {
        println!("No articles");
        return;
    }
    for summary in summaries {
        println!(
            "{:<7} {:<13} {}",
            summary.id,
            format_date(&summary.published_at),
            truncate_string(&summary.title, 70)
        );
        println!("{:<21} {}", "", truncate_string(&strip_html(&summary.excerpt), 90));
    }
}
