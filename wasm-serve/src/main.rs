//! A simple HTTP server for the attention view
//!
//! Serves the wasm build with correct MIME types and, when given a bundle
//! file, a generated host page rendering that bundle at `/`.

use attention::{host_page, AttentionBundle, AttentionConfig, AttentionParams};
use clap::Parser;
use mime_guess::MimeGuess;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Response, Server, StatusCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wasm-serve")]
#[command(about = "Serve the attention view wasm build")]
struct Args {
    /// Directory to serve files from
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Attention bundle (JSON) to render at `/`
    #[arg(short, long)]
    bundle: Option<PathBuf>,

    /// URL of the wasm-bindgen JS module, relative to the served page
    #[arg(long, default_value = "./pkg/att_viz.js")]
    script: String,

    /// Id of the root container in the generated page
    #[arg(long, default_value = "AttViz")]
    root_id: String,
}

type HttpResponse = Response<std::io::Cursor<Vec<u8>>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let root_dir = args.directory.canonicalize().unwrap_or_else(|_| {
        error!("directory '{}' not found", args.directory.display());
        std::process::exit(1);
    });

    let page = args.bundle.as_ref().map(|path| {
        load_page(path, &args.root_id, &args.script).unwrap_or_else(|e| {
            error!("bundle '{}': {}", path.display(), e);
            std::process::exit(1);
        })
    });

    let addr = format!("{}:{}", args.host, args.port);
    let server = Server::http(&addr).unwrap_or_else(|e| {
        error!("starting server: {}", e);
        std::process::exit(1);
    });

    info!("serving '{}' at http://{}", root_dir.display(), addr);
    if let Some(path) = &args.bundle {
        info!("rendering '{}' at /", path.display());
    }

    for request in server.incoming_requests() {
        let url_path = request.url().to_string();
        let url_path = url_path.split('?').next().unwrap_or(&url_path);

        // Decode URL-encoded characters
        let decoded_path = urlencoded_decode(url_path);
        let relative_path = decoded_path.trim_start_matches('/');

        if let Some(page) = &page {
            if relative_path.is_empty() || relative_path == "index.html" {
                info!("{} {} -> 200 (bundle page)", request.method(), url_path);
                let _ = request.respond(html_response(page));
                continue;
            }
        }

        let response = match resolve(&root_dir, relative_path) {
            Ok(path) => serve_file(&path).unwrap_or_else(|_| not_found()),
            Err(response) => response,
        };
        info!("{} {} -> {}", request.method(), url_path, response.status_code().0);
        let _ = request.respond(response);
    }
}

/// Read and validate a bundle file, and build its host page.
fn load_page(path: &Path, root_id: &str, script: &str) -> Result<String, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let bundle: AttentionBundle = serde_json::from_str(&json)?;
    let params = AttentionParams::new(bundle, root_id);

    // Fail at startup rather than in the browser
    AttentionConfig::from_params(params.clone())?;

    Ok(host_page(&params, script)?)
}

/// Map a request path to a file under `root_dir`.
fn resolve(root_dir: &Path, relative_path: &str) -> Result<PathBuf, HttpResponse> {
    let file_path = if relative_path.is_empty() {
        root_dir.join("index.html")
    } else {
        root_dir.join(relative_path)
    };

    // Security: prevent directory traversal
    let canonical = file_path.canonicalize().map_err(|_| not_found())?;
    if !canonical.starts_with(root_dir) {
        return Err(forbidden());
    }

    // If directory, try index.html
    if canonical.is_dir() {
        Ok(canonical.join("index.html"))
    } else {
        Ok(canonical)
    }
}

fn serve_file(path: &Path) -> Result<HttpResponse, std::io::Error> {
    let mut file = fs::File::open(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;

    Ok(with_wasm_headers(Response::from_data(contents), get_mime_type(path)))
}

fn html_response(page: &str) -> HttpResponse {
    with_wasm_headers(Response::from_data(page.as_bytes().to_vec()), "text/html; charset=utf-8")
}

fn with_wasm_headers(response: HttpResponse, mime: &str) -> HttpResponse {
    let mut response = response;
    let headers = [
        ("Content-Type", mime),
        // Add CORS headers for WASM
        ("Access-Control-Allow-Origin", "*"),
        ("Cross-Origin-Opener-Policy", "same-origin"),
        ("Cross-Origin-Embedder-Policy", "require-corp"),
    ];
    for (name, value) in headers {
        if let Ok(header) = Header::from_bytes(name, value) {
            response = response.with_header(header);
        }
    }
    response
}

fn get_mime_type(path: &Path) -> &'static str {
    // Handle WASM specially since mime_guess might not have it
    if let Some(ext) = path.extension() {
        match ext.to_str() {
            Some("wasm") => return "application/wasm",
            Some("js") => return "application/javascript",
            Some("mjs") => return "application/javascript",
            Some("json") => return "application/json",
            _ => {}
        }
    }

    MimeGuess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
}

fn not_found() -> HttpResponse {
    Response::from_string("404 Not Found")
        .with_status_code(StatusCode(404))
}

fn forbidden() -> HttpResponse {
    Response::from_string("403 Forbidden")
        .with_status_code(StatusCode(403))
}

fn urlencoded_decode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                result.push(byte as char);
            } else {
                result.push('%');
                result.push_str(&hex);
            }
        } else if c == '+' {
            result.push(' ');
        } else {
            result.push(c);
        }
    }

    result
}
