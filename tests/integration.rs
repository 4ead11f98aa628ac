//! Integration tests for the Carte layout pipeline.
//!
//! These tests exercise the full path from menu data to canvas blocks.
//! They verify:
//! - Repeated passes produce the same canvas
//! - Overlays never duplicate
//! - The gap fills the page, across grid rows
//! - User-placed blocks keep their stacking order
//! - Layout styles merge and drop fields as configured
//! - Missing data is skipped, never fatal

use std::collections::HashMap;
use std::time::{Duration, Instant};

use carte::canvas::names::{self, meta};
use carte::canvas::{find_page_block, BlockId, BlockType, CanvasEngine, Scene};
use carte::config::LayoutConfig;
use carte::layout::{ElementInfo, LayoutEngine, LayoutInfo};
use carte::model::*;
use carte::overlay;
use carte::persistence::MemoryPersistence;
use carte::store::MenuStore;
use carte::templates::SceneTemplates;
use carte::Workspace;
use serde_json::json;

// ─── Helpers ────────────────────────────────────────────────────

fn make_templates() -> Vec<TemplateLayout> {
    serde_json::from_value(json!([
        {
            "id": "dish",
            "kind": "dish",
            "elements": [
                { "role": "title", "fontSize": 14 },
                { "role": "description", "fontSize": 10 },
                { "role": "addons", "fontSize": 9 },
                { "role": "price", "fontSize": 11, "width": 0.75 }
            ]
        },
        {
            "id": "title",
            "kind": "sectionTitle",
            "elements": [ { "role": "sectionTitle", "fontSize": 20 } ]
        }
    ]))
    .unwrap()
}

fn make_dish(id: &str, order: i64, title: &str, description: &str, price: &str) -> Dish {
    let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Dish {
        dish_id: id.to_string(),
        title: text(title),
        description: text(description),
        price: text(price),
        order_position: order,
        ..Default::default()
    }
}

fn make_spacer(id: &str, order: i64, points: f64) -> Dish {
    let mut dish = Dish::spacer(id, points);
    dish.order_position = order;
    dish
}

fn make_section(id: &str, x: u32, y: u32, w: u32, dishes: Vec<Dish>) -> Section {
    let mut section: Section = serde_json::from_value(json!({
        "sectionId": id,
        "placement": { "x": x, "y": y, "w": w, "h": 1 },
        "dishTemplate": "dish",
        "titleTemplate": "title"
    }))
    .unwrap();
    section.dishes = dishes;
    section
}

/// A margin-free page with no column gap.
fn make_page(id: &str, columns: u32, width: f64, height: f64, sections: Vec<Section>) -> Page {
    let mut page: Page = serde_json::from_value(json!({
        "pageId": id,
        "size": { "Custom": { "width": width, "height": height } },
        "columns": columns,
        "columnGap": 0.0
    }))
    .unwrap();
    page.sections = sections;
    page
}

fn make_menu(pages: Vec<Page>) -> Menu {
    Menu {
        pages,
        templates: make_templates(),
        ..Default::default()
    }
}

fn all_elements(info: &LayoutInfo) -> Vec<&ElementInfo> {
    info.pages
        .iter()
        .flat_map(|p| p.elements.iter())
        .flat_map(|e| e.walk())
        .collect()
}

fn named<'a>(info: &'a LayoutInfo, name: &str) -> Vec<&'a ElementInfo> {
    let mut found: Vec<&ElementInfo> = all_elements(info)
        .into_iter()
        .filter(|e| e.name == name)
        .collect();
    found.sort_by(|a, b| a.y.total_cmp(&b.y));
    found
}

fn dish_element<'a>(info: &'a LayoutInfo, dish_id: &str) -> &'a ElementInfo {
    all_elements(info)
        .into_iter()
        .find(|e| e.dish_id.as_deref() == Some(dish_id))
        .unwrap_or_else(|| panic!("no block for dish {}", dish_id))
}

/// Geometry and content of every block, without block ids.
fn snapshot(info: &LayoutInfo) -> Vec<String> {
    all_elements(info)
        .iter()
        .map(|e| {
            format!(
                "{} {:?} {:.4} {:.4} {:.4} {:.4} {:?}",
                e.name, e.dish_id, e.x, e.y, e.width, e.height, e.text_content
            )
        })
        .collect()
}

fn user_block(scene: &mut Scene, page: BlockId, name: &str) -> BlockId {
    let block = scene.create(BlockType::Graphic);
    scene.append_child(page, block).unwrap();
    scene.set_name(block, name).unwrap();
    block
}

fn child_index(scene: &Scene, page: BlockId, block: BlockId) -> usize {
    scene
        .children(page)
        .unwrap()
        .iter()
        .position(|c| *c == block)
        .unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn dinner_menu() -> Menu {
    make_menu(vec![make_page(
        "p1",
        2,
        8.5,
        11.0,
        vec![
            make_section(
                "starters",
                0,
                0,
                1,
                vec![
                    Dish {
                        dish_id: "starters-title".into(),
                        kind: DishType::SectionTitle,
                        title: Some("Starters".into()),
                        ..Default::default()
                    },
                    make_dish("burrata", 1, "Burrata", "Heirloom tomato, basil oil", "14"),
                    make_dish("soup", 2, "Soup", "", "9"),
                ],
            ),
            make_section(
                "mains",
                1,
                0,
                1,
                vec![
                    make_dish("steak", 0, "Hanger Steak", "Chimichurri, hand-cut fries", "32"),
                    make_dish("salmon", 1, "Salmon", "Fennel, citrus", "29"),
                ],
            ),
        ],
    )])
}

// ─── Idempotence ────────────────────────────────────────────────

#[test]
fn test_relayout_is_idempotent() {
    let mut workspace = Workspace::open(dinner_menu()).unwrap();
    let first = workspace.layout_now();
    assert_eq!(first.pages.len(), 1);
    let before = snapshot(&workspace.info().unwrap());
    let blocks = workspace.scene().block_count();

    let now = Instant::now();
    workspace.edit_dish(now, "p1", "mains", "steak", |_| {}).unwrap();
    let second = workspace.layout_now();
    assert_eq!(second.pages.len(), 1);

    assert_eq!(snapshot(&workspace.info().unwrap()), before);
    assert_eq!(workspace.scene().block_count(), blocks);
    assert_close(second.pages[0].gap, first.pages[0].gap);
}

#[test]
fn test_one_group_per_section() {
    let mut workspace = Workspace::open(dinner_menu()).unwrap();
    let report = workspace.layout_now();
    let page = &report.pages[0];
    assert_eq!(page.sections.len(), 2);

    let info = workspace.info().unwrap();
    let groups = named(&info, names::SECTION);
    assert_eq!(groups.len(), 2);
    for group in groups {
        assert!(group.section_id.is_some());
        assert!(group.children.iter().all(|c| c.name == names::SECTION_DISH));
    }
    for section in &page.sections {
        assert_eq!(workspace.store().section_group(&section.section_id), Some(section.group));
    }
}

// ─── Overlays ───────────────────────────────────────────────────

#[test]
fn test_no_duplicate_overlays() {
    let mut workspace = Workspace::open(dinner_menu()).unwrap();
    workspace.layout_now();

    let now = Instant::now();
    workspace.edit_dish(now, "p1", "mains", "steak", |d| d.price = Some("34".into())).unwrap();
    workspace.edit_dish(now, "p1", "mains", "salmon", |d| d.price = Some("31".into())).unwrap();
    let scene = workspace.scene();
    assert_eq!(scene.find_by_name(names::LOADER_CHANGES_GRAPHIC).len(), 1);
    assert_eq!(scene.find_by_name(names::APPLY_LOADER_TEXT).len(), 1);
    assert!(workspace.indicator().arrow_visible());

    workspace.layout_now();
    let scene = workspace.scene();
    for name in names::OVERLAY_NAMES {
        assert!(scene.find_by_name(name).is_empty(), "{} left behind", name);
    }
    assert!(!workspace.indicator().arrow_visible());
}

// ─── Gap solving ────────────────────────────────────────────────

#[test]
fn test_gap_fills_page_exactly() {
    // Five 1.8in spacers on an 11in page: (11 - 9) / 4 = 0.5.
    let spacers = (0..5).map(|i| make_spacer(&format!("s{}", i), i, 129.6)).collect();
    let menu = make_menu(vec![make_page(
        "p1",
        1,
        8.5,
        11.0,
        vec![make_section("s1", 0, 0, 1, spacers)],
    )]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();

    let page = report.page("p1").unwrap();
    assert_close(page.gap, 0.5);
    assert!(!page.overflow);
    assert_eq!(page.dish_count, 5);

    let info = workspace.info().unwrap();
    let ys: Vec<f64> = named(&info, names::SECTION_SPACER).iter().map(|e| e.y).collect();
    assert_eq!(ys.len(), 5);
    for (i, y) in ys.iter().enumerate() {
        assert_close(*y, i as f64 * 2.3);
    }
}

#[test]
fn test_section_with_more_dishes_sets_row_gap() {
    // A: two 4in spacers. B beside it: ten 0.5in spacers, nine gaps in 6in.
    let tall = (0..2).map(|i| make_spacer(&format!("a{}", i), i, 288.0)).collect();
    let busy = (0..10).map(|i| make_spacer(&format!("b{}", i), i, 36.0)).collect();
    let menu = make_menu(vec![make_page(
        "p1",
        2,
        8.5,
        11.0,
        vec![make_section("a", 0, 0, 1, tall), make_section("b", 1, 0, 1, busy)],
    )]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();

    let page = report.page("p1").unwrap();
    assert_close(page.gap, 6.0 / 9.0);
    assert!(!page.overflow, "warnings: {:?}", page.warnings);
    assert_eq!(page.dish_count, 10);
    assert!(page.warnings.is_empty());

    let info = workspace.info().unwrap();
    let last = dish_element(&info, "b9");
    assert_close(last.y + last.height, 11.0);
    assert_close(dish_element(&info, "a1").y, 4.0 + 6.0 / 9.0);
    for section in &page.sections {
        assert!(section.bottom <= 11.0 + 1e-6);
    }
}

#[test]
fn test_row_transition_aligns_columns() {
    // Row 0: A (2in + 2in) beside B (1in). Row 1: C (3in) across both.
    // gap = (10 - 7) / (3 - 1 + 1 * (2 - 1)) = 1.
    let mut page = make_page(
        "p1",
        2,
        10.0,
        10.0,
        vec![
            make_section("a", 0, 0, 1, vec![make_spacer("a1", 0, 144.0), make_spacer("a2", 1, 144.0)]),
            make_section("b", 1, 0, 1, vec![make_spacer("b1", 0, 72.0)]),
            make_section("c", 0, 1, 2, vec![make_spacer("c1", 0, 216.0)]),
        ],
    );
    page.section_gap_multiplier = 2.0;
    let mut workspace = Workspace::open(make_menu(vec![page])).unwrap();
    let report = workspace.layout_now();

    let page = report.page("p1").unwrap();
    assert_close(page.gap, 1.0);
    assert_eq!(page.row_transitions, 1);
    assert!(!page.overflow);

    let info = workspace.info().unwrap();
    assert_close(dish_element(&info, "a1").y, 0.0);
    assert_close(dish_element(&info, "a2").y, 3.0);
    assert_close(dish_element(&info, "b1").y, 0.0);
    assert_close(dish_element(&info, "b1").x, 5.0);
    // Lowest cursor (6) plus one extra gap for the row change.
    assert_close(dish_element(&info, "c1").y, 7.0);
    assert_close(dish_element(&info, "c1").width, 10.0);
}

#[test]
fn test_section_columns_share_the_gap() {
    // Two 4in dish columns with a 0.5in margin. The right column (3 x 1in)
    // binds: (11 - 3) / 2 = 4.
    let mut left = make_spacer("l1", 0, 72.0);
    left.column = 0;
    let mut dishes = vec![left, make_spacer("l2", 1, 72.0)];
    for i in 0..3 {
        let mut spacer = make_spacer(&format!("r{}", i), i, 72.0);
        spacer.column = 1;
        dishes.push(spacer);
    }
    let mut section = make_section("s1", 0, 0, 1, dishes);
    section.columns = 2;
    section.column_margin = 0.5;
    let menu = make_menu(vec![make_page("p1", 1, 8.5, 11.0, vec![section])]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();

    let page = report.page("p1").unwrap();
    assert_close(page.gap, 4.0);
    assert!(!page.overflow);
    assert_eq!(page.sections.len(), 1);
    assert_close(page.sections[0].top, 0.0);
    assert_close(page.sections[0].bottom, 11.0);

    let info = workspace.info().unwrap();
    for id in ["l1", "l2"] {
        assert_close(dish_element(&info, id).x, 0.0);
        assert_close(dish_element(&info, id).width, 4.0);
    }
    for id in ["r0", "r1", "r2"] {
        assert_close(dish_element(&info, id).x, 4.5);
    }
    assert_close(dish_element(&info, "l2").y, 5.0);
    assert_close(dish_element(&info, "r2").y, 10.0);

    // Both columns end up in the one section group.
    let groups = named(&info, names::SECTION);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].children.len(), 5);
}

#[test]
fn test_borders_frame_realized_blocks() {
    let mut framed = make_spacer("b", 1, 72.0);
    framed.border = Some(BorderImage {
        uri: "dish.png".into(),
        margins: Edges::uniform(0.1),
    });
    let mut section = make_section(
        "s1",
        0,
        0,
        1,
        vec![make_spacer("a", 0, 72.0), framed, make_spacer("c", 2, 72.0)],
    );
    section.border = Some(BorderImage {
        uri: "frame.png".into(),
        margins: Edges::uniform(0.25),
    });
    let menu = make_menu(vec![make_page("p1", 1, 8.5, 11.0, vec![section])]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();

    // Entries: 0.25 + 1, 0.1 + 1 + 0.1, 1 + 0.25 = 3.7in; (11 - 3.7) / 2.
    let page = report.page("p1").unwrap();
    assert_close(page.gap, 3.65);
    assert!(!page.overflow);

    let info = workspace.info().unwrap();
    assert_close(dish_element(&info, "a").y, 0.25);
    let dish = dish_element(&info, "b");
    assert_close(dish.x, 0.35);
    assert_close(dish.y, 5.0);
    assert_close(dish.width, 7.8);

    let groups = named(&info, names::SECTION);
    assert_eq!(groups.len(), 1);
    let group = groups[0];
    assert_eq!(
        child_names(group),
        vec![
            names::SECTION_BORDER,
            names::SECTION_SPACER,
            names::DISH_BORDER,
            names::SECTION_SPACER,
            names::SECTION_SPACER,
        ]
    );
    assert_eq!(group.children[3].dish_id.as_deref(), Some("b"));

    let dish_frame = group.children[2].rect();
    assert_close(dish_frame.x, 0.25);
    assert_close(dish_frame.y, 4.9);
    assert_close(dish_frame.width, 8.0);
    assert_close(dish_frame.height, 1.2);

    let section_frame = group.children[0].rect();
    assert_close(section_frame.x, 0.0);
    assert_close(section_frame.y, 0.0);
    assert_close(section_frame.width, 8.5);
    assert_close(section_frame.height, 11.0);
}

#[test]
fn test_overflow_clamps_gap_and_warns() {
    let spacers = (0..3).map(|i| make_spacer(&format!("s{}", i), i, 288.0)).collect();
    let menu = make_menu(vec![make_page(
        "p1",
        1,
        10.0,
        10.0,
        vec![make_section("s1", 0, 0, 1, spacers)],
    )]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();

    let page = report.page("p1").unwrap();
    assert!(page.overflow);
    assert!(report.has_overflow());
    assert_close(page.gap, LayoutConfig::default().readable_gap);
    assert!(!page.warnings.is_empty());
}

#[test]
fn test_top_margin_becomes_leading_spacer() {
    let mut section = make_section(
        "s1",
        0,
        0,
        1,
        vec![
            make_dish("d1", 0, "Soup", "", "5"),
            make_dish("d2", 1, "Salad", "", "7"),
            make_dish("d3", 2, "Bread", "", "3"),
        ],
    );
    section.top_margin = Some(20.0);
    let menu = make_menu(vec![make_page("p1", 1, 8.5, 11.0, vec![section])]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();
    assert_eq!(report.pages[0].dish_count, 4);

    let info = workspace.info().unwrap();
    let groups = named(&info, names::SECTION);
    let group = groups[0];
    assert_eq!(group.children.len(), 4);
    let spacer = &group.children[0];
    assert_eq!(spacer.name, names::SECTION_SPACER);
    assert_eq!(spacer.dish_id.as_deref(), Some("s1-top-margin"));
    assert_close(spacer.height, 20.0 / 72.0);
    assert!(dish_element(&info, "d1").y > spacer.y + spacer.height);
}

// ─── Layer order ────────────────────────────────────────────────

#[test]
fn test_layer_order_round_trip() {
    let mut workspace = Workspace::open(dinner_menu()).unwrap();
    let page = find_page_block(workspace.scene(), "p1").unwrap();
    let scene = workspace.scene_mut();
    let logo = user_block(scene, page, "logo");
    let stamp = user_block(scene, page, "stamp");
    let note = user_block(scene, page, "note");
    scene.insert_child(page, stamp, 0).unwrap();
    scene.insert_child(page, note, 1).unwrap();

    let indices = |workspace: &Workspace| {
        [logo, stamp, note].map(|b| child_index(workspace.scene(), page, b))
    };
    assert_eq!(indices(&workspace), [2, 0, 1]);

    workspace.layout_now();
    assert_eq!(indices(&workspace), [2, 0, 1]);
    assert!(workspace.scene().metadata(logo, meta::USER_PLACED).unwrap().is_some());

    workspace.edit_dish(Instant::now(), "p1", "starters", "soup", |d| {
        d.description = Some("Daily".into())
    })
    .unwrap();
    workspace.layout_now();
    assert_eq!(indices(&workspace), [2, 0, 1]);
    for block in [logo, stamp, note] {
        assert!(workspace.scene().is_valid(block));
    }
}

#[test]
fn test_user_block_stays_above_sections() {
    let mut workspace = Workspace::open(dinner_menu()).unwrap();
    workspace.layout_now();
    let page = find_page_block(workspace.scene(), "p1").unwrap();
    let sticker = user_block(workspace.scene_mut(), page, "sticker");
    assert_eq!(child_index(workspace.scene(), page, sticker), 2);

    workspace.edit_dish(Instant::now(), "p1", "mains", "steak", |d| {
        d.price = Some("34".into())
    })
    .unwrap();
    workspace.layout_now();

    let children = workspace.scene().children(page).unwrap();
    assert_eq!(children.len(), 3);
    assert_eq!(child_index(workspace.scene(), page, sticker), 2);
    for section in &children[..2] {
        assert_eq!(workspace.scene().name(*section).unwrap(), names::SECTION);
    }
}

// ─── Layout styles ──────────────────────────────────────────────

fn styled_menu(dishes: Vec<Dish>, settings: LayoutSettings) -> Menu {
    let mut menu = make_menu(vec![make_page(
        "p1",
        1,
        8.5,
        11.0,
        vec![make_section("s1", 0, 0, 1, dishes)],
    )]);
    menu.layout_settings = HashMap::from([("s1".to_string(), settings)]);
    menu
}

fn child_names(element: &ElementInfo) -> Vec<&str> {
    element.children.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn test_title_and_price_with_empty_title() {
    let menu = styled_menu(
        vec![
            make_dish("d1", 0, "", "Rich and creamy", "$12"),
            make_dish("d2", 1, "Soup", "", "$5"),
        ],
        LayoutSettings {
            is_dish_title_and_price: true,
            ..Default::default()
        },
    );
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();
    assert!(report.failed.is_empty());

    let info = workspace.info().unwrap();
    let empty_title = dish_element(&info, "d1");
    assert_eq!(child_names(empty_title), vec!["description"]);

    let merged = dish_element(&info, "d2");
    assert_eq!(child_names(merged), vec!["title"]);
    assert_eq!(merged.children[0].text_content.as_deref(), Some("Soup  $5"));
}

#[test]
fn test_description_and_price_merges_into_description() {
    let menu = styled_menu(
        vec![make_dish("d1", 0, "Tart", "Lemon curd", "$8")],
        LayoutSettings {
            is_dish_description_and_price: true,
            ..Default::default()
        },
    );
    let mut workspace = Workspace::open(menu).unwrap();
    workspace.layout_now();

    let info = workspace.info().unwrap();
    let dish = dish_element(&info, "d1");
    assert_eq!(child_names(dish), vec!["title", "description"]);
    assert_eq!(dish.children[1].text_content.as_deref(), Some("Lemon curd  $8"));
}

#[test]
fn test_justified_price_sits_on_the_right() {
    let menu = styled_menu(
        vec![make_dish("d1", 0, "Steak", "Chimichurri", "32")],
        LayoutSettings {
            is_justify_price_top: true,
            ..Default::default()
        },
    );
    let mut workspace = Workspace::open(menu).unwrap();
    workspace.layout_now();

    let info = workspace.info().unwrap();
    let dish = dish_element(&info, "d1");
    let title = dish.children.iter().find(|c| c.name == "title").unwrap();
    let price = dish.children.iter().find(|c| c.name == "price").unwrap();
    assert_close(price.width, 0.75);
    assert_close(price.x + price.width, dish.x + dish.width);
    assert_close(price.y, title.y);
    assert!(title.width <= dish.width - 0.75 + 1e-9);
}

// ─── Null safety ────────────────────────────────────────────────

#[test]
fn test_empty_fields_never_fail_the_page() {
    let kinds = [
        DishType::Dish,
        DishType::SectionTitle,
        DishType::Spacer,
        DishType::SectionSpacer,
        DishType::InlineText,
        DishType::InlineImage,
        DishType::InlineSectionDivider,
    ];
    let dishes = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| Dish {
            dish_id: format!("d{}", i),
            kind: *kind,
            order_position: i as i64,
            ..Default::default()
        })
        .collect();
    let mut workspace = Workspace::open(styled_menu(dishes, LayoutSettings::default())).unwrap();
    let report = workspace.layout_now();

    assert!(report.failed.is_empty());
    assert_eq!(report.pages.len(), 1);
    let scene = workspace.scene();
    for name in [
        names::SECTION_SPACER,
        names::INLINE_TEXT,
        names::INLINE_IMAGE,
        names::SECTION_DIVIDER,
    ] {
        assert!(scene.find_by_name(name).is_empty(), "{} should be destroyed", name);
    }
}

#[test]
fn test_missing_template_skips_only_that_dish() {
    let mut section = make_section(
        "s1",
        0,
        0,
        1,
        vec![make_dish("d1", 0, "Soup", "", "5"), make_spacer("gap", 1, 36.0)],
    );
    section.dish_template = "nope".into();
    let menu = make_menu(vec![make_page("p1", 1, 8.5, 11.0, vec![section])]);
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();

    assert!(report.failed.is_empty());
    let info = workspace.info().unwrap();
    assert!(named(&info, names::SECTION_DISH).is_empty());
    assert_eq!(named(&info, names::SECTION_SPACER).len(), 1);
}

#[test]
fn test_inline_elements_follow_section_alignment() {
    let mut section = make_section(
        "s1",
        0,
        0,
        1,
        vec![Dish {
            dish_id: "leaf".into(),
            kind: DishType::InlineSectionDivider,
            divider: Some(ImageAsset {
                uri: "leaf.png".into(),
                width: 400.0,
                height: 100.0,
                height_inches: 0.5,
            }),
            ..Default::default()
        }],
    );
    section.alignment = HorizontalAlign::Center;
    let menu = make_menu(vec![make_page("p1", 1, 8.0, 10.0, vec![section])]);
    let mut workspace = Workspace::open(menu).unwrap();
    workspace.layout_now();

    let info = workspace.info().unwrap();
    let divider = dish_element(&info, "leaf");
    assert_eq!(divider.name, names::SECTION_DIVIDER);
    assert_close(divider.width, 2.0);
    assert_close(divider.height, 0.5);
    assert_close(divider.x, 3.0);
}

// ─── Orchestrator edges ─────────────────────────────────────────

#[test]
fn test_page_missing_from_canvas_stays_changed() {
    let menu = make_menu(vec![
        make_page("p1", 1, 8.5, 11.0, vec![make_section("s1", 0, 0, 1, vec![make_spacer("a", 0, 72.0)])]),
        make_page("p2", 1, 8.5, 11.0, vec![]),
    ]);
    let mut scene = Scene::new();
    let templates = SceneTemplates::load(&mut scene, &menu.templates).unwrap();
    scene.add_page("p1", 8.5, 11.0);
    let mut store = MenuStore::new(menu);
    store.mark_all_changed();
    let mut sink = MemoryPersistence::new();

    let report = LayoutEngine::default().process_changed_pages(&mut scene, &templates, &mut store, &mut sink);

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.skipped, vec!["p2".to_string()]);
    assert_eq!(store.changed_page_ids(), vec!["p2".to_string()]);
    assert!(report.saved);
    assert_eq!(sink.save_count(), 1);
}

#[test]
fn test_page_missing_from_store_clears_loader() {
    let mut scene = Scene::new();
    let templates = SceneTemplates::default();
    let ghost = scene.add_page("ghost", 8.5, 11.0);
    overlay::set_busy(&mut scene, ghost, true, &LayoutConfig::default()).unwrap();
    let mut store = MenuStore::new(Menu::default());
    store.mark_changed("ghost");
    let mut sink = MemoryPersistence::new();

    let report = LayoutEngine::default().process_changed_pages(&mut scene, &templates, &mut store, &mut sink);

    assert_eq!(report.skipped, vec!["ghost".to_string()]);
    assert!(!overlay::is_busy(&scene));
    assert!(!store.has_changes());
    assert_eq!(sink.save_count(), 1);
}

#[test]
fn test_nothing_changed_does_nothing() {
    let mut scene = Scene::new();
    let templates = SceneTemplates::default();
    let mut store = MenuStore::new(Menu::default());
    let mut sink = MemoryPersistence::new();

    let report = LayoutEngine::default().process_changed_pages(&mut scene, &templates, &mut store, &mut sink);
    assert!(report.pages.is_empty());
    assert_eq!(sink.save_count(), 0);
}

// ─── Scheduling ─────────────────────────────────────────────────

#[test]
fn test_edits_are_debounced() {
    let mut workspace = Workspace::open(dinner_menu()).unwrap();
    workspace.layout_now();
    let t0 = Instant::now();
    let ms = Duration::from_millis;

    workspace.edit_dish(t0, "p1", "mains", "steak", |d| d.title = Some("Ribeye".into())).unwrap();
    assert!(workspace.indicator().is_shown());
    assert!(workspace.tick(t0 + ms(100)).is_none());

    workspace.edit_dish(t0 + ms(200), "p1", "mains", "steak", |d| d.price = Some("38".into())).unwrap();
    assert!(workspace.tick(t0 + ms(450)).is_none());
    assert!(workspace.is_layout_pending());

    let report = workspace.tick(t0 + ms(500)).expect("layout runs once edits settle");
    assert_eq!(report.pages.len(), 1);
    assert!(!workspace.is_layout_pending());
    assert!(!workspace.indicator().is_shown());
    assert!(!workspace.store().has_changes());

    let info = workspace.info().unwrap();
    let steak = dish_element(&info, "steak");
    let title = steak.children.iter().find(|c| c.name == "title").unwrap();
    assert_eq!(title.text_content.as_deref(), Some("Ribeye"));
}

#[test]
fn test_layout_json_round_trip() {
    let json = serde_json::to_string(&json!({
        "templates": serde_json::to_value(make_templates()).unwrap(),
        "pages": [ {
            "pageId": "p1",
            "sections": [ {
                "sectionId": "s1",
                "dishTemplate": "dish",
                "dishes": [ { "dishId": "d1", "title": "Soup", "price": "5" } ]
            } ]
        } ]
    }))
    .unwrap();
    let output: serde_json::Value = serde_json::from_str(&carte::layout_json(&json).unwrap()).unwrap();
    assert_eq!(output["report"]["pages"][0]["pageId"], "p1");
    assert_eq!(output["layout"]["pages"][0]["width"], 8.5);
    assert!(output["report"]["saved"].as_bool().unwrap());
}

#[test]
fn test_layout_json_reports_parse_errors() {
    let err = carte::layout_json("{ \"pages\": [ }").unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse menu"));
}

#[test]
fn test_unreadable_font_falls_back() {
    let mut menu = dinner_menu();
    menu.fonts = vec![FontSource {
        family: "Playfair Display".into(),
        weight: 400,
        italic: false,
        src: "data:font/ttf;base64,AAAA".into(),
    }];
    let mut workspace = Workspace::open(menu).unwrap();
    let report = workspace.layout_now();
    assert!(report.failed.is_empty());
    assert_eq!(report.pages[0].sections.len(), 2);
}
