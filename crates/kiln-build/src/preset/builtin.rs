//! Presets shipped with kiln.

use kiln_config::KilnConfig;
use serde_json::{Value, json};

use super::{Handler, Preset, PresetKind, StaticSitePrebuild};

pub const STORAGE_ORIGIN: &str = "origin-storage-default";

const STATIC_ASSETS: &str =
    ".(css|js|ttf|woff|woff2|pdf|svg|jpg|jpeg|gif|bmp|png|ico|mp4|json|xml|html)$";

/// Serves single-page apps: assets by path, every route from `/index.html`.
const SPA_HANDLER: &str = r#"export default async function handler(event) {
  const { pathname } = new URL(event.request.url);
  const asset = /\.[^.]+$/.test(pathname) ? pathname : '/index.html';
  return fetch(new URL(asset, 'file://'));
}
"#;

/// Serves generated sites: assets by path, routes from `<route>/index.html`.
const SSG_HANDLER: &str = r#"export default async function handler(event) {
  const { pathname } = new URL(event.request.url);
  const path = pathname.length > 1 && pathname.endsWith('/') ? pathname.slice(0, -1) : pathname;
  let asset;
  if (path === '/') {
    asset = '/index.html';
  } else if (/\.[^.]+$/.test(path)) {
    asset = path;
  } else {
    asset = `${path}/index.html`;
  }
  return fetch(new URL(asset, 'file://'));
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routing {
    SinglePage,
    Generated,
}

struct StaticSite {
    name: &'static str,
    framework: &'static str,
    out_dir: &'static str,
    routing: Routing,
}

const STATIC_SITES: &[StaticSite] = &[
    StaticSite { name: "angular", framework: "Angular", out_dir: "dist/browser", routing: Routing::SinglePage },
    StaticSite { name: "astro", framework: "Astro", out_dir: "dist", routing: Routing::Generated },
    StaticSite { name: "docusaurus", framework: "Docusaurus", out_dir: "build", routing: Routing::Generated },
    StaticSite { name: "eleventy", framework: "Eleventy", out_dir: "_site", routing: Routing::Generated },
    StaticSite { name: "gatsby", framework: "Gatsby", out_dir: "public", routing: Routing::Generated },
    StaticSite { name: "hexo", framework: "Hexo", out_dir: "public", routing: Routing::Generated },
    StaticSite { name: "hugo", framework: "Hugo", out_dir: "public", routing: Routing::Generated },
    StaticSite { name: "jekyll", framework: "Jekyll", out_dir: "_site", routing: Routing::Generated },
    StaticSite { name: "next", framework: "Next.js", out_dir: "out", routing: Routing::Generated },
    StaticSite { name: "preact", framework: "Preact", out_dir: "build", routing: Routing::SinglePage },
    StaticSite { name: "qwik", framework: "Qwik", out_dir: "dist", routing: Routing::Generated },
    StaticSite { name: "react", framework: "React", out_dir: "dist", routing: Routing::SinglePage },
    StaticSite { name: "svelte", framework: "Svelte", out_dir: "build", routing: Routing::SinglePage },
    StaticSite { name: "vitepress", framework: "VitePress", out_dir: ".vitepress/dist", routing: Routing::Generated },
    StaticSite { name: "vue", framework: "Vue", out_dir: "dist", routing: Routing::SinglePage },
];

/// All built-in presets, in registration order.
pub fn all() -> Vec<Preset> {
    let mut presets = vec![javascript(), typescript(), html()];
    presets.extend(STATIC_SITES.iter().map(static_site));
    presets
}

/// User code, no hooks.
pub fn javascript() -> Preset {
    Preset::new("javascript", PresetKind::Compute).with_config(compute_config("javascript", "js"))
}

pub fn typescript() -> Preset {
    Preset::new("typescript", PresetKind::Compute)
        .with_ext("ts")
        .with_config(compute_config("typescript", "ts"))
}

/// Plain files from `public/`, copied as they are.
pub fn html() -> Preset {
    Preset::new("html", PresetKind::Deliver)
        .with_handler(Handler::Inline(SSG_HANDLER.to_string()))
        .with_prebuild(StaticSitePrebuild::copy_only("HTML", "public"))
        .with_config(deliver_config("html", Routing::Generated))
}

fn static_site(site: &StaticSite) -> Preset {
    let handler = match site.routing {
        Routing::SinglePage => SPA_HANDLER,
        Routing::Generated => SSG_HANDLER,
    };
    let mut prebuild = StaticSitePrebuild::new(site.framework, site.out_dir);
    match site.name {
        "angular" => prebuild = prebuild.arg("--output-path=dist"),
        "vitepress" => prebuild = prebuild.script("docs:build"),
        _ => {}
    }

    Preset::new(site.name, PresetKind::Deliver)
        .with_handler(Handler::Inline(handler.to_string()))
        .with_prebuild(prebuild)
        .with_config(deliver_config(site.name, site.routing))
}

fn compute_config(preset: &str, ext: &str) -> KilnConfig {
    KilnConfig::from(as_map(json!({
        "build": {
            "preset": preset,
            "extension": ext,
            "polyfills": true,
            "worker": false
        },
        "rules": {
            "request": [
                {
                    "name": "Execute Edge Function",
                    "match": "^\\/",
                    "runFunction": { "path": ".edge/worker.js" }
                }
            ]
        }
    })))
}

/// Storage origin plus delivery rules, in the legacy flat rule shape.
fn deliver_config(preset: &str, routing: Routing) -> KilnConfig {
    let origin = json!({ "name": STORAGE_ORIGIN, "type": "object_storage" });
    let mut request = vec![
        json!({
            "name": "Set Storage Origin for All Requests",
            "match": "^\\/",
            "setOrigin": origin
        }),
        json!({
            "name": "Deliver Static Assets",
            "match": STATIC_ASSETS,
            "setOrigin": origin,
            "deliver": true
        }),
    ];
    match routing {
        Routing::SinglePage => request.push(json!({
            "name": "Redirect to index.html",
            "match": "^\\/",
            "rewrite": { "set": "/index.html" }
        })),
        Routing::Generated => {
            request.push(json!({
                "name": "Redirect to index.html",
                "match": ".*/$",
                "rewrite": { "set": "${uri}index.html" }
            }));
            request.push(json!({
                "name": "Redirect to index.html for Subpaths",
                "match": "^(?!.*\\/$)(?![\\s\\S]*\\.[a-zA-Z0-9]+$).*",
                "rewrite": { "set": "${uri}/index.html" }
            }));
        }
    }

    KilnConfig::from(as_map(json!({
        "build": {
            "preset": preset,
            "polyfills": false,
            "worker": false
        },
        "origin": [origin],
        "rules": { "request": request }
    })))
}

fn as_map(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}
