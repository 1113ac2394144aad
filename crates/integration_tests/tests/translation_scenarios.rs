//! Translation behavior observed through the loader, on real files.

use anyhow::Result;
use integration_tests::{init_tracing, TemplateTree};
use legacy_loader::{Error, TemplateSource};
use rain_to_twig::RainToTwig;

#[test]
fn implicit_loop_keeps_numbered_and_alias_bindings() -> Result<()> {
    init_tracing();
    let tree = TemplateTree::new();
    tree.write_view("items.html", r#"{loop="$items"}{$value}{/loop}"#);

    let context = tree.loader().source_context("items.html")?;
    assert_eq!(
        context.code,
        "{% for key1, value1 in items %}{% set value = value1 %}{% set key = key1 %}{{ value|raw }}{% endfor %}"
    );
    Ok(())
}

#[test]
fn conditional_and_assignment_scenarios() -> Result<()> {
    init_tracing();
    let tree = TemplateTree::new();
    tree.write_view("cond.html", r#"{if="$a == 1"}{$a}{else}{$b}{/if}"#);
    tree.write_view("assign.html", "{$total+=$tax}");
    tree.write_view("func.html", r#"{function="strip_tags($desc)"}"#);

    let loader = tree.loader();
    assert_eq!(
        loader.source_context("cond.html")?.code,
        "{% if a == 1 %}{{ a|raw }}{% else %}{{ b|raw }}{% endif %}"
    );
    assert_eq!(
        loader.source_context("assign.html")?.code,
        "{% set total = total + tax %}"
    );
    assert_eq!(loader.source_context("func.html")?.code, "{{ desc|striptags }}");
    Ok(())
}

#[test]
fn translated_output_is_stable_under_retranslation() -> Result<()> {
    // Output of a translated legacy template contains no legacy markers, so
    // running it through the translator again changes nothing.
    init_tracing();
    let tree = TemplateTree::new();
    tree.write_view(
        "stable.html",
        r#"{if="$ok"}{loop="$rows" as $row}{$row|count}{/loop}{/if}"#,
    );

    let once = tree.loader().source_context("stable.html")?.code;
    let translator = RainToTwig::new()?;
    assert_eq!(translator.translate(&once)?, once);
    Ok(())
}

#[test]
fn malformed_loop_nesting_surfaces_as_translation_error() {
    init_tracing();
    let tree = TemplateTree::new();
    tree.write_view("broken.html", r#"{loop="$a"}{loop="$b"}{/loop}"#);

    let error = tree.loader().source_context("broken.html").unwrap_err();
    assert!(matches!(error, Error::Translation(_)));
}

#[test]
fn comment_contents_survive_loading_verbatim() -> Result<()> {
    init_tracing();
    let tree = TemplateTree::new();
    tree.write_view("doc.html", "{* TODO revisar {$total} *}<p>{$total}</p>");

    let code = tree.loader().source_context("doc.html")?.code;
    assert_eq!(code, "{#  TODO revisar {$total}  #}<p>{{ total|raw }}</p>");
    Ok(())
}
