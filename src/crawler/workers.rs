//! Discovery and page workers
//!
//! Each worker processes exactly one work item handed to it by the
//! scheduler, pushes whatever downstream work it discovers, and returns.
//! Failures are recorded in the fault sink; no worker error ever crosses a
//! queue boundary or aborts the run.

use crate::crawler::persist::PersistTask;
use crate::crawler::{extract, CrawlContext};
use crate::storage::PageRecord;
use crate::url::{article_identity, namespace_index_path, ArticleRef};
use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Redirect chains longer than this stop being followed
pub const MAX_REDIRECT_HOPS: u32 = 10;

async fn fetch_body(ctx: &CrawlContext, url: &Url) -> crate::Result<String> {
    let response = ctx.fetcher.get(url).await?;
    Ok(response.text().await?)
}

/// Parses a listing page and seeds the namespace queue
pub(crate) async fn listing_worker(ctx: Arc<CrawlContext>, url: Url) {
    let body = match fetch_body(&ctx, &url).await {
        Ok(body) => body,
        Err(error) => {
            ctx.faults
                .record("listing", Some(url.as_str()), error.to_string());
            return;
        }
    };

    let names = {
        let html = Html::parse_document(&body);
        extract::namespace_names(&html)
    };

    tracing::debug!("listing {} yielded {} namespaces", url, names.len());
    for name in names {
        let index = ctx.canon.canonicalize(&namespace_index_path(&name));
        ctx.queues.namespace.push(index);
    }
}

/// Parses one namespace-index page: discovers the namespace's remaining
/// pagination pages (first page only) and pushes every article link
pub(crate) async fn namespace_worker(ctx: Arc<CrawlContext>, url: Url) {
    let body = match fetch_body(&ctx, &url).await {
        Ok(body) => body,
        Err(error) => {
            ctx.faults
                .record("namespace", Some(url.as_str()), error.to_string());
            return;
        }
    };

    let first_page = !url.query().map(|q| q.contains("page")).unwrap_or(false);
    let (total_pages, links) = {
        let html = Html::parse_document(&body);
        (extract::pagination_total(&html), extract::article_links(&html))
    };

    if first_page {
        if let Some(total) = total_pages {
            let separator = if url.query().is_some() { '&' } else { '?' };
            for page in 2..=total {
                let next = ctx
                    .canon
                    .canonicalize(&format!("{}{}page={}", url, separator, page));
                ctx.queues.namespace.push(next);
            }
        }
    }

    for href in links {
        ctx.queues.page.push(ctx.canon.canonicalize(&href));
    }
}

/// Fetches one article, resolves its alias chain, extracts title and links,
/// and emits a persistence task
pub(crate) async fn page_worker(ctx: Arc<CrawlContext>, url: Url) {
    if let Err(error) = crawl_page(&ctx, &url).await {
        ctx.faults.record("page", Some(url.as_str()), error.to_string());
    }
}

async fn crawl_page(ctx: &CrawlContext, url: &Url) -> crate::Result<()> {
    let article = article_identity(url);

    let mut response = ctx.fetcher.get(url).await?;
    let http_status = response.status().as_u16();

    // Follow the redirect chain hop by hop, bounded
    let mut hops = 0u32;
    while response.status().is_redirection() && hops < MAX_REDIRECT_HOPS {
        let Some(location) = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
        else {
            break;
        };
        let next = ctx.canon.canonicalize(&location);
        response = ctx.fetcher.get(&next).await?;
        hops += 1;
    }

    let final_url = response.url().clone();
    let alias_of = if hops > 0 {
        Some(article_identity(&final_url)).filter(|target| *target != article)
    } else {
        None
    };

    let body = response.text().await?;
    if body.is_empty() {
        // nothing to parse; persist the bare record
        let record = PageRecord {
            article,
            http_status,
            title: None,
            alias_of,
        };
        ctx.queues.persist.push(PersistTask::new(record, HashSet::new()));
        return Ok(());
    }

    let html = Html::parse_document(&body);
    let title = if alias_of.is_some() {
        extract::aka_title(&html).or_else(|| extract::heading_title(&html))
    } else {
        extract::heading_title(&html)
    };

    if alias_of.is_some() {
        // This page's links belong to its canonical target. Re-enqueue the
        // target under its own identity and persist the alias without links.
        let mut canonical_url = final_url;
        canonical_url.set_query(None);
        ctx.queues
            .page
            .push(ctx.canon.canonicalize(canonical_url.as_str()));

        let record = PageRecord {
            article,
            http_status,
            title,
            alias_of,
        };
        ctx.queues.persist.push(PersistTask::new(record, HashSet::new()));
        return Ok(());
    }

    let mut links: HashSet<ArticleRef> = HashSet::new();
    for href in extract::article_links(&html) {
        let link_url = ctx.canon.canonicalize(&href);
        links.insert(article_identity(&link_url));
        ctx.queues.page.push(link_url);
    }

    let record = PageRecord {
        article,
        http_status,
        title,
        alias_of: None,
    };
    ctx.queues.persist.push(PersistTask::new(record, links));
    Ok(())
}
