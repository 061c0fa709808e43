/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end rendering tests for clipnote-template.
 */

use clipnote_page::{Highlight, HtmlDom, MetaAttr, NullDom, PageContext};
use clipnote_template::{Compiler, render};

fn page() -> PageContext {
    PageContext::builder()
        .url("https://x.test/a#:~:text=hello")
        .title("Hello")
        .author("Jo Doe")
        .description("A test page")
        .published("2024-06-15T10:00:00Z")
        .site("X Test")
        .content_html("<h1>Hello</h1><p>Body <b>bold</b>.</p>")
        .meta_entry(MetaAttr::Property, "og:image", "https://x.test/i.png")
        .add_json_ld(
            r#"{
                "@context": "https://schema.org",
                "@type": "Recipe",
                "name": "Bread",
                "ingredients": [{"name": "flour"}, {"name": "sugar"}]
            }"#,
        )
        .highlights(vec![
            Highlight {
                text: "x".to_string(),
                timestamp: "2024-06-15T10:01:00Z".to_string(),
                notes: None,
            },
            Highlight {
                text: "y".to_string(),
                timestamp: "2024-06-15T10:02:00Z".to_string(),
                notes: None,
            },
        ])
        .timestamp(1_718_445_600)
        .build()
}

#[test]
fn test_filtered_variable() {
    let out = render("{{title|upper}}", &page(), &NullDom);
    assert_eq!(out.text, "HELLO");
}

#[test]
fn test_for_loop_over_missing_variable() {
    let out = render("{% for t in tags %}[{{t}}] {% endfor %}", &page(), &NullDom);
    assert_eq!(out.text, "");
}

#[test]
fn test_for_loop_over_highlights() {
    let out = render(
        "{% for h in highlights %}[{{h.text}}] {% endfor %}",
        &page(),
        &NullDom,
    );
    assert_eq!(out.text, "[x] [y] ");
}

#[test]
fn test_schema_splat_join() {
    let out = render(
        r#"{{schema:@Recipe:ingredients[*].name|join:", "}}"#,
        &page(),
        &NullDom,
    );
    assert_eq!(out.text, "flour, sugar");
}

#[test]
fn test_url_fragment_stripped() {
    let out = render("{{url}}", &page(), &NullDom);
    assert_eq!(out.text, "https://x.test/a");
}

#[test]
fn test_selector_unique_join() {
    let dom = HtmlDom::parse(
        r#"<i class="tag">A</i><i class="tag">B</i><i class="tag">A</i>"#,
    );
    let out = render(r#"{{selector:.tag|unique|join:"-"}}"#, &page(), &dom);
    assert_eq!(out.text, "A-B");
}

#[test]
fn test_highlights_map_template() {
    let out = render(
        r#"{{highlights|map:item => ({t:item.text})|template:"- ${t}\n"}}"#,
        &page(),
        &NullDom,
    );
    assert_eq!(out.text, "- x\n- y\n");
}

#[test]
fn test_meta_provider() {
    let out = render("{{meta:property:og:image}}", &page(), &NullDom);
    assert_eq!(out.text, "https://x.test/i.png");
}

#[test]
fn test_derived_content_is_markdown() {
    let out = render("{{content}}", &page(), &NullDom);
    assert_eq!(out.text, "# Hello\n\nBody **bold**.");
}

#[test]
fn test_published_date_reformat() {
    let out = render(r#"{{published|date:"MMM D, YYYY"}}"#, &page(), &NullDom);
    assert_eq!(out.text, "Jun 15, 2024");
}

#[test]
fn test_note_body_composition() {
    let template = "---\ntitle: {{title|safe_name}}\nsource: {{url}}\n---\n\n{{content|blockquote}}";
    let out = render(template, &page(), &NullDom);
    assert_eq!(
        out.text,
        "---\ntitle: Hello\nsource: https://x.test/a\n---\n\n> # Hello\n> \n> Body **bold**."
    );
}

#[test]
fn test_fragment_link_filter() {
    let out = render(
        "{{highlights|fragment_link|join:\"\\n\"}}",
        &page(),
        &NullDom,
    );
    assert_eq!(
        out.text,
        "[x](https://x.test/a#:~:text=x)\n[y](https://x.test/a#:~:text=y)"
    );
}

#[test]
fn test_empty_template() {
    let out = render("", &page(), &NullDom);
    assert_eq!(out.text, "");
}

#[test]
fn test_plain_text_untouched() {
    let text = "No placeholders here. Just text & punctuation!";
    let out = render(text, &page(), &NullDom);
    assert_eq!(out.text, text);
}

#[test]
fn test_all_constructs_consumed() {
    let template =
        "{{title}}{% for i in schema:@Recipe:ingredients %}{{i.name}}{% endfor %}{{missing|upper}}";
    let out = render(template, &page(), &NullDom);
    assert!(!out.text.contains("{{"));
    assert!(!out.text.contains("{%"));
    assert_eq!(out.text, "Hellofloursugar");
}

#[test]
fn test_prompt_roundtrip() {
    let out = render(
        r#"Summary:\n{{"summarize the page"|blockquote}}"#,
        &page(),
        &NullDom,
    );
    assert_eq!(out.prompts.len(), 1);
    assert_eq!(out.prompts[0].prompt, "summarize the page");

    let done = out.resolve_prompts(&["short summary".to_string()]);
    assert!(done.contains("> short summary"));
    assert!(!done.contains('\u{1a}'));
}

#[test]
fn test_compiler_cache_stability() {
    let compiler = Compiler::new();
    let page = page();
    let template = "{{title}} / {{schema:@Recipe:name}} / {{date}}";
    let first = compiler.render(template, &page, &NullDom);
    for _ in 0..3 {
        assert_eq!(compiler.render(template, &page, &NullDom), first);
    }
}

#[test]
fn test_nested_loop_with_schema_source() {
    let out = render(
        "{% for i in schema:@Recipe:ingredients %}{{i.name|capitalize}}; {% endfor %}",
        &page(),
        &NullDom,
    );
    assert_eq!(out.text, "Flour; Sugar; ");
}

#[test]
fn test_filter_chain_order() {
    // split -> slice -> join is order sensitive.
    let page = PageContext::builder()
        .url("https://x.test/a")
        .title("a,b,c,d")
        .timestamp(0)
        .build();
    let out = render(
        r#"{{title|split:","|slice:(1,3)|join:"+"}}"#,
        &page,
        &NullDom,
    );
    assert_eq!(out.text, "b+c");
}

#[test]
fn test_loop_over_non_array_is_empty() {
    let out = render("A{% for c in title %}{{c}}{% endfor %}B", &page(), &NullDom);
    assert_eq!(out.text, "AB");
}

#[test]
fn test_markdown_filter_uses_context_url() {
    let page = PageContext::builder()
        .url("https://x.test/dir/page")
        .title("t")
        .timestamp(0)
        .build();
    let dom = HtmlDom::parse(r#"<div class="c"><a href="rel">go</a></div>"#);
    let out = render("{{selectorHtml:.c|markdown}}", &page, &dom);
    assert_eq!(out.text, "[go](https://x.test/dir/rel)");
}
