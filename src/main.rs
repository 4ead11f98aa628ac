//! # Carte CLI
//!
//! Usage:
//!   carte menu.json -o layout.json
//!   echo '{ ... }' | carte -o layout.json
//!   carte menu.json --scene scene.json
//!   carte --example > menu.json
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`; `-v` for
//! `debug`).

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carte::persistence::FilePersistence;
use carte::{CarteError, Workspace};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_menu_json());
        return ExitCode::SUCCESS;
    }

    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let default_filter = if verbose { "carte=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), CarteError> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1])?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let option = |flag: &str| {
        args.windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].clone())
    };
    let output_path = option("-o");
    let scene_path = option("--scene");

    let menu = carte::parse_menu(&input)?;
    let mut workspace = Workspace::open(menu)?;
    if let Some(path) = &scene_path {
        workspace = workspace.with_persistence(FilePersistence::new(path));
    }

    let report = workspace.layout_now();
    let output = carte::LayoutOutput {
        layout: workspace.info()?,
        report,
    };
    let json = serde_json::to_string_pretty(&output)?;

    for page in &output.report.pages {
        for warning in &page.warnings {
            eprintln!("! page {}: {}", page.page_id, warning);
        }
    }
    for failure in &output.report.failed {
        eprintln!("✗ page {}: {}", failure.page_id, failure.error);
    }

    match output_path {
        Some(path) => {
            fs::write(&path, &json)?;
            eprintln!(
                "✓ Laid out {} page(s), written to {}",
                output.report.pages.len(),
                path
            );
        }
        None => println!("{}", json),
    }
    if let Some(path) = scene_path {
        if output.report.saved {
            eprintln!("✓ Scene saved to {}", path);
        }
    }
    Ok(())
}

fn example_menu_json() -> &'static str {
    r##"{
  "layout": { "debounceMs": 300 },
  "templates": [
    {
      "id": "classic-dish",
      "kind": "dish",
      "elements": [
        { "role": "title", "fontSize": 13, "typeface": { "family": "Helvetica", "weight": 700 }, "textCase": "Uppercase" },
        { "role": "description", "fontSize": 10, "color": { "r": 0.35, "g": 0.35, "b": 0.35 } },
        { "role": "addons", "fontSize": 9, "typeface": { "family": "Helvetica", "italic": true } },
        { "role": "price", "fontSize": 12, "width": 0.8 }
      ]
    },
    {
      "id": "classic-title",
      "kind": "sectionTitle",
      "elements": [
        { "role": "sectionTitle", "fontSize": 20, "typeface": { "family": "Helvetica", "weight": 700 }, "textCase": "Uppercase" },
        { "role": "sectionAddons", "fontSize": 10 }
      ]
    }
  ],
  "layoutSettings": {
    "starters": { "isJustifyPriceTop": true },
    "desserts": { "isDishTitleAndPrice": true }
  },
  "pages": [
    {
      "pageId": "dinner-1",
      "size": "Letter",
      "columns": 2,
      "margins": { "top": 0.6, "right": 0.5, "bottom": 0.6, "left": 0.5 },
      "columnGap": 0.3,
      "sectionGapMultiplier": 2,
      "sections": [
        {
          "sectionId": "starters",
          "name": "Starters",
          "placement": { "x": 0, "y": 0, "w": 1, "h": 1 },
          "dishTemplate": "classic-dish",
          "titleTemplate": "classic-title",
          "dishes": [
            { "dishId": "starters-title", "type": "sectionTitle", "title": "Starters", "orderPosition": 0 },
            { "dishId": "burrata", "title": "Burrata", "description": "Heirloom tomato, basil oil, grilled sourdough", "price": "14", "orderPosition": 1 },
            { "dishId": "calamari", "title": "Crispy Calamari", "description": "Lemon aioli, pickled chili", "price": "13", "dietaryIcons": "GF", "orderPosition": 2 },
            { "dishId": "soup", "title": "Soup of the Day", "price": "9", "secondPrice": "12", "addOns": "Add bread +3", "orderPosition": 3 }
          ]
        },
        {
          "sectionId": "mains",
          "name": "Mains",
          "placement": { "x": 1, "y": 0, "w": 1, "h": 1 },
          "topMargin": 12,
          "border": { "uri": "frames/thin.png", "margins": { "top": 0.1, "right": 0.1, "bottom": 0.1, "left": 0.1 } },
          "dishTemplate": "classic-dish",
          "titleTemplate": "classic-title",
          "dishes": [
            { "dishId": "mains-title", "type": "sectionTitle", "title": "Mains", "orderPosition": 0 },
            { "dishId": "steak", "title": "Hanger Steak", "description": "Chimichurri, hand-cut fries", "price": "32", "orderPosition": 1 },
            { "dishId": "salmon", "title": "Seared Salmon", "description": "Fennel, citrus, brown butter", "price": "29", "orderPosition": 2 },
            { "dishId": "risotto", "title": "Mushroom Risotto", "description": "Parmesan, thyme", "price": "24", "dietaryIcons": "V", "orderPosition": 3 }
          ]
        },
        {
          "sectionId": "desserts",
          "name": "Desserts",
          "placement": { "x": 0, "y": 1, "w": 2, "h": 1 },
          "columns": 2,
          "columnMargin": 0.3,
          "alignment": "center",
          "dishTemplate": "classic-dish",
          "titleTemplate": "classic-title",
          "dishes": [
            { "dishId": "desserts-title", "type": "sectionTitle", "title": "Desserts", "orderPosition": 0 },
            { "dishId": "tiramisu", "title": "Tiramisu", "price": "10", "orderPosition": 1 },
            { "dishId": "divider", "type": "inlineSectionDivider", "divider": { "uri": "ornaments/leaf.png", "width": 600, "height": 80, "heightInches": 0.25 }, "orderPosition": 2 },
            { "dishId": "gelato", "title": "Gelato", "price": "8", "column": 1, "orderPosition": 0 },
            { "dishId": "spacer", "type": "spacer", "payload": "{\"height\": 18, \"width\": 0}", "column": 1, "orderPosition": 1 },
            { "dishId": "note", "type": "inlineText", "description": "Ask your server about today's specials.", "column": 1, "orderPosition": 2 }
          ]
        }
      ]
    }
  ]
}
"##
}
