use design_sync::design_tool::{DocumentNode, StyleRef};
use design_sync::model::TokenMap;
use design_sync::tokens::{self, TokenStore, rgba_to_hex, sanitize_token_name};
use serde_json::json;

fn style(key: &str, name: &str, style_type: &str) -> StyleRef {
    serde_json::from_value(json!({
        "key": key,
        "name": name,
        "style_type": style_type,
    }))
    .expect("style deserializes")
}

fn document_fixture() -> DocumentNode {
    serde_json::from_value(json!({
        "name": "Document",
        "children": [
            {
                "name": "Brand/Primary",
                "styles": { "fill": "S:color-1" },
                "fills": [
                    { "type": "SOLID", "color": { "r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0 } }
                ]
            },
            {
                "name": "Overlay",
                "styles": { "fill": "S:color-2" },
                "fills": [
                    { "type": "SOLID", "color": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 0.5 } }
                ]
            },
            {
                "name": "Heading/H1",
                "styles": { "text": "S:text-1" },
                "style": {
                    "fontFamily": "Inter",
                    "fontSize": 32.0,
                    "fontWeight": 700.0,
                    "lineHeightPx": 40.0,
                    "letterSpacing": 0.0
                }
            },
            {
                "name": "Card Shadow",
                "styles": { "effect": "S:effect-1" },
                "effects": [
                    {
                        "type": "DROP_SHADOW",
                        "offset": { "x": 0.0, "y": 4.0 },
                        "radius": 8.0,
                        "color": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 0.25 }
                    }
                ]
            },
            {
                "name": "Spacing/MD",
                "absoluteBoundingBox": { "width": 16.0, "height": 4.0 }
            },
            {
                "name": "Radius SM",
                "cornerRadius": 6.0
            }
        ]
    }))
    .expect("document deserializes")
}

#[test]
fn extracts_all_token_categories() {
    let document = document_fixture();
    let styles = vec![
        style("S:color-1", "Brand/Primary", "FILL"),
        style("S:color-2", "Overlay", "FILL"),
        style("S:text-1", "Heading/H1", "TEXT"),
        style("S:effect-1", "Card Shadow", "EFFECT"),
    ];

    let tokens = tokens::extract(&document, &styles);

    assert_eq!(tokens.colors.get("brand-primary").unwrap(), "#ff0000");
    // Translucent fill carries a 2-digit alpha suffix.
    assert_eq!(tokens.colors.get("overlay").unwrap(), "#00000080");

    let heading = tokens.typography.get("heading-h1").unwrap();
    assert_eq!(heading.font_family, "Inter");
    assert_eq!(heading.font_size, "32px");
    assert_eq!(heading.font_weight, 700);
    assert_eq!(heading.line_height, "40px");
    assert_eq!(heading.letter_spacing, "normal");

    assert_eq!(
        tokens.shadows.get("card-shadow").unwrap(),
        "0px 4px 8px rgba(0, 0, 0, 0.25)"
    );

    assert_eq!(tokens.spacing.get("spacing-md").unwrap(), "16px");
    assert_eq!(tokens.border_radius.get("radius-sm").unwrap(), "6px");
}

#[test]
fn first_referencing_node_in_document_order_wins() {
    let document: DocumentNode = serde_json::from_value(json!({
        "name": "Document",
        "children": [
            {
                "name": "First",
                "styles": { "fill": "S:shared" },
                "fills": [
                    { "type": "SOLID", "color": { "r": 1.0, "g": 1.0, "b": 1.0, "a": 1.0 } }
                ]
            },
            {
                "name": "Second",
                "styles": { "fill": "S:shared" },
                "fills": [
                    { "type": "SOLID", "color": { "r": 0.0, "g": 0.0, "b": 0.0, "a": 1.0 } }
                ]
            }
        ]
    }))
    .expect("document deserializes");

    let tokens = tokens::extract(&document, &[style("S:shared", "Shared", "FILL")]);
    assert_eq!(tokens.colors.get("shared").unwrap(), "#ffffff");
}

#[test]
fn failing_styles_are_skipped_without_aborting() {
    let document = document_fixture();
    let styles = vec![
        // References nothing in the tree.
        style("S:ghost", "Ghost Style", "FILL"),
        style("S:color-1", "Brand/Primary", "FILL"),
        // Unknown style type is ignored.
        style("S:grid", "Layout Grid", "GRID"),
    ];

    let tokens = tokens::extract(&document, &styles);
    assert_eq!(tokens.colors.len(), 1);
    assert!(tokens.colors.contains_key("brand-primary"));
}

#[test]
fn non_solid_first_fill_yields_no_token() {
    let document: DocumentNode = serde_json::from_value(json!({
        "name": "Document",
        "children": [{
            "name": "Gradient",
            "styles": { "fill": "S:grad" },
            "fills": [{ "type": "GRADIENT_LINEAR" }]
        }]
    }))
    .expect("document deserializes");

    let tokens = tokens::extract(&document, &[style("S:grad", "Gradient", "FILL")]);
    assert!(tokens.colors.is_empty());
}

#[test]
fn sanitization_and_hex_helpers() {
    assert_eq!(sanitize_token_name("Brand / Primary (500)"), "brand-primary-500");
    assert_eq!(rgba_to_hex(0.2, 0.4, 0.6, 1.0), "#336699");
    assert_eq!(rgba_to_hex(0.2, 0.4, 0.6, 0.25), "#33669940");
}

#[test]
fn store_merge_is_shallow_per_category() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let store = TokenStore::new(workspace.path().join("tokens.json"));

    let mut existing = TokenMap::default();
    existing
        .colors
        .insert("primary".to_string(), "#111111".to_string());
    existing
        .colors
        .insert("legacy".to_string(), "#222222".to_string());
    existing
        .spacing
        .insert("sm".to_string(), "8px".to_string());
    store.save(&existing).expect("seed store");

    let mut newer = TokenMap::default();
    newer
        .colors
        .insert("primary".to_string(), "#333333".to_string());
    let merged = store.merge_and_save(newer).expect("merge");

    // Same-named keys are overwritten; unseen keys persist.
    assert_eq!(merged.colors.get("primary").unwrap(), "#333333");
    assert_eq!(merged.colors.get("legacy").unwrap(), "#222222");
    assert_eq!(merged.spacing.get("sm").unwrap(), "8px");

    let reloaded = store.load().expect("reload");
    assert_eq!(reloaded, merged);
}

#[test]
fn missing_store_loads_empty() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let store = TokenStore::new(workspace.path().join("nope/tokens.json"));
    let map = store.load().expect("load");
    assert!(map.is_empty());
}
