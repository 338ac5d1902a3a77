use std::convert::Infallible;
use std::io;
use std::io::ErrorKind;
use std::sync::Arc;

use chrono::Utc;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use spdlog::{error, info, warn};

use crate::config::{Cms, CmsKind, Config};
use crate::content::content_source::{ContentSource, SourceError};
use crate::content::file_source::FileSource;
use crate::content::sanity_source::SanitySource;
use crate::content::Post;
use crate::content_cache::CachedSource;
use crate::forms::{self, ContactForm, FormRelay, HttpFormRelay, NewsletterForm, SubmissionStatus};
use crate::listing::{list_page, recent_posts};
use crate::query_string::QueryString;
use crate::sitemap::build_sitemap;
use crate::view::list_renderer::ListRenderer;
use crate::view::page_renderer::PageRenderer;
use crate::view::post_renderer::PostRenderer;
use crate::view::read_template;
use crate::view::sitemap_renderer::{render_robots, render_sitemap};

const LATEST_COUNT: usize = 3;
const RELATED_COUNT: usize = 3;

pub struct AppState {
    config: Config,
    source: Box<dyn ContentSource>,
    relay: Box<dyn FormRelay>,
}

type SharedState = web::types::State<Arc<AppState>>;

fn html(body: String) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

// Content store and form relay calls block, so they run on the thread pool.
async fn with_source<T, F>(state: &Arc<AppState>, f: F) -> Result<T, SourceError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ContentSource) -> Result<T, SourceError> + Send + Sync + 'static,
{
    let state = state.clone();
    web::block(move || Ok::<_, Infallible>(f(state.source.as_ref())))
        .await
        .unwrap_or(Err(SourceError::Canceled))
}

async fn with_relay<F>(state: &Arc<AppState>, on_cancel: SubmissionStatus, f: F) -> SubmissionStatus
where
    F: FnOnce(&dyn FormRelay) -> SubmissionStatus + Send + Sync + 'static,
{
    let state = state.clone();
    web::block(move || Ok::<_, Infallible>(f(state.relay.as_ref())))
        .await
        .unwrap_or(on_cancel)
}

async fn latest_posts(state: &Arc<AppState>) -> Vec<Post> {
    match with_source(state, |source| source.fetch_posts()).await {
        Ok(posts) => recent_posts(&posts, LATEST_COUNT).into_iter().cloned().collect(),
        Err(e) => {
            error!("Error fetching latest posts: {}", e);
            vec![]
        }
    }
}

fn render_page(config: &Config, name: &str, latest: &[Post], status: Option<&SubmissionStatus>) -> io::Result<String> {
    let template_src = read_template(&config.paths.template_dir, &format!("{}.tpl", name))?;
    let renderer = PageRenderer::new(&template_src, name)?;
    let latest: Vec<&Post> = latest.iter().collect();
    Ok(renderer.render(config, &latest, status))
}

fn page_response(config: &Config, name: &str, latest: &[Post], status: Option<&SubmissionStatus>) -> web::HttpResponse {
    match render_page(config, name, latest, status) {
        Ok(rendered) => html(rendered),
        Err(e) => {
            error!("Error rendering page {}: {}", name, e);
            web::HttpResponse::InternalServerError()
                .body(format!("Error rendering page {}: {}", name, e))
        }
    }
}

#[web::get("/")]
async fn index(state: SharedState) -> web::HttpResponse {
    let latest = latest_posts(&state).await;
    page_response(&state.config, "index", &latest, None)
}

#[web::get("/about")]
async fn about(state: SharedState) -> web::HttpResponse {
    page_response(&state.config, "about", &[], None)
}

#[web::get("/services")]
async fn services(state: SharedState) -> web::HttpResponse {
    page_response(&state.config, "services", &[], None)
}

#[web::get("/contact")]
async fn contact(state: SharedState) -> web::HttpResponse {
    page_response(&state.config, "contact", &[], None)
}

#[web::post("/contact")]
async fn contact_submit(form: web::types::Form<ContactForm>, state: SharedState) -> web::HttpResponse {
    let form = form.into_inner();
    let status = with_relay(&state, SubmissionStatus::contact(false), move |relay| {
        forms::submit_contact(relay, &form)
    }).await;
    page_response(&state.config, "contact", &[], Some(&status))
}

#[web::post("/newsletter")]
async fn newsletter(form: web::types::Form<NewsletterForm>, state: SharedState) -> web::HttpResponse {
    let form = form.into_inner();
    let status = with_relay(&state, SubmissionStatus::newsletter(false), move |relay| {
        forms::subscribe_newsletter(relay, &form)
    }).await;
    page_response(&state.config, "newsletter", &[], Some(&status))
}

#[web::get("/privacy-policy")]
async fn privacy_policy(state: SharedState) -> web::HttpResponse {
    page_response(&state.config, "privacy-policy", &[], None)
}

#[web::get("/terms-and-conditions")]
async fn terms_and_conditions(state: SharedState) -> web::HttpResponse {
    page_response(&state.config, "terms-and-conditions", &[], None)
}

#[web::get("/disclaimer")]
async fn disclaimer(state: SharedState) -> web::HttpResponse {
    page_response(&state.config, "disclaimer", &[], None)
}

#[web::get("/blog")]
async fn blog_list(req: HttpRequest, state: SharedState) -> web::HttpResponse {
    let qs = req.uri().query().map(QueryString::from).unwrap_or_else(QueryString::empty);
    let query = qs.list_query();
    let cur_page = qs.get_page();
    let config = &state.config;

    let template_src = match read_template(&config.paths.template_dir, "bloglist.tpl") {
        Ok(src) => src,
        Err(e) => return web::HttpResponse::InternalServerError()
            .body(format!("Error listing posts: {}", e)),
    };
    let renderer = match ListRenderer::new(&template_src, config) {
        Ok(renderer) => renderer,
        Err(e) => return web::HttpResponse::InternalServerError()
            .body(format!("Error listing posts: {}", e)),
    };

    let rendered = match with_source(&state, |source| source.fetch_posts()).await {
        Ok(posts) => {
            let page = list_page(&posts, &query, cur_page, config.blog.page_size);
            let recent = recent_posts(&posts, LATEST_COUNT);
            renderer.render(&page, &query, cur_page, &recent)
        }
        Err(e) => {
            error!("Error fetching posts: {}", e);
            renderer.render_fetch_failed(&query)
        }
    };

    html(rendered)
}

#[web::get("/blog/{slug}")]
async fn blog_post(slug: web::types::Path<String>, state: SharedState) -> web::HttpResponse {
    let slug = slug.into_inner();
    let config = &state.config;

    let found = with_source(&state, move |source| {
        let Some(post) = source.fetch_post(&slug)? else {
            return Ok(None);
        };
        let related = source.fetch_related(&post, RELATED_COUNT).unwrap_or_else(|e| {
            warn!("Error fetching related posts for {}: {}", post.slug, e);
            vec![]
        });
        Ok(Some((post, related)))
    }).await;

    let (post, related) = match found {
        Ok(Some(found)) => found,
        Ok(None) => return web::HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body("Post not found"),
        Err(e) => {
            error!("Error fetching post: {}", e);
            return web::HttpResponse::BadGateway()
                .body("The post could not be loaded. Please try again later.");
        }
    };

    let template_src = match read_template(&config.paths.template_dir, "post.tpl") {
        Ok(src) => src,
        Err(e) => return web::HttpResponse::InternalServerError()
            .body(format!("Error loading post {}: {}", post.slug, e)),
    };
    let response = match PostRenderer::new(&template_src, config) {
        Ok(renderer) => html(renderer.render(&post, &related)),
        Err(e) => web::HttpResponse::InternalServerError()
            .body(format!("Error loading post {}: {}", post.slug, e)),
    };
    response
}

#[web::get("/sitemap.xml")]
async fn sitemap(state: SharedState) -> web::HttpResponse {
    // The static routes are still listed when the store is unreachable.
    let posts = with_source(&state, |source| source.fetch_posts()).await
        .unwrap_or_else(|e| {
            error!("Error fetching posts for sitemap: {}", e);
            vec![]
        });

    let entries = build_sitemap(&state.config.site.base_url, &posts, Utc::now());
    match render_sitemap(&entries) {
        Ok(xml) => web::HttpResponse::Ok()
            .content_type("application/xml; charset=utf-8")
            .body(xml),
        Err(e) => web::HttpResponse::InternalServerError()
            .body(format!("Error generating sitemap: {}", e)),
    }
}

#[web::get("/robots.txt")]
async fn robots(state: SharedState) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(render_robots(&state.config.site.base_url))
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>, state: SharedState) -> Result<NamedFile, web::Error> {
    if path.contains("../") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

pub fn build_source(cms: &Cms) -> io::Result<Box<dyn ContentSource>> {
    let source: Box<dyn ContentSource> = match cms.kind {
        CmsKind::Sanity => {
            let source = SanitySource::from_config(cms).ok_or_else(|| io::Error::new(
                ErrorKind::InvalidInput, "cms.project_id and cms.dataset are required for sanity"))?;
            info!("Reading posts from project {:?}", cms.project_id);
            Box::new(source)
        }
        CmsKind::File => {
            let snapshot_path = cms.snapshot_path.clone().ok_or_else(|| io::Error::new(
                ErrorKind::InvalidInput, "cms.snapshot_path is required for file"))?;
            info!("Reading posts from {}", snapshot_path.display());
            Box::new(FileSource::new(snapshot_path))
        }
    };

    let source: Box<dyn ContentSource> = match cms.cache_ttl_secs {
        Some(ttl) if ttl > 0 => Box::new(CachedSource::new(source, ttl)),
        _ => source,
    };
    Ok(source)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let source = build_source(&config.cms)?;
    let relay = Box::new(HttpFormRelay::new(config.forms.clone()));

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    info!("Serving {} on {}:{}", config.site.name, bind_addr, bind_port);

    let app_state = Arc::new(AppState {
        config,
        source,
        relay,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(about)
            .service(services)
            .service(contact)
            .service(contact_submit)
            .service(newsletter)
            .service(privacy_policy)
            .service(terms_and_conditions)
            .service(disclaimer)
            .service(blog_list)
            .service(blog_post)
            .service(sitemap)
            .service(robots)
            .service(public_files)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
