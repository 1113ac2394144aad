use super::*;

fn rewrite(input: &str) -> Result<String, TranslateError> {
    let expr = ExpressionTranslator::new().expect("Failed to build expression translator");
    let loops = LoopRewriter::new().expect("Failed to build loop rewriter");
    loops.rewrite(input, &expr)
}

#[test]
fn test_implicit_loop_binds_numbered_and_alias_names() {
    let out = rewrite(r#"{loop="$items"}x{/loop}"#).unwrap();
    assert_eq!(
        out,
        "{% for key1, value1 in items %}{% set value = value1 %}{% set key = key1 %}x{% endfor %}"
    );
}

#[test]
fn test_nested_implicit_loops_number_by_depth() {
    let out = rewrite(r#"{loop="$rows"}{loop="$cols"}x{/loop}{/loop}"#).unwrap();
    assert!(out.contains("{% for key1, value1 in rows %}"));
    assert!(out.contains("{% for key2, value2 in cols %}"));
    // The unnumbered aliases are rebound by the inner loop and never
    // restored on close; last write wins.
    assert!(out.contains("{% set value = value2 %}"));
}

#[test]
fn test_sequential_loops_reuse_depth_one_names() {
    let out = rewrite(r#"{loop="$a"}x{/loop}{loop="$b"}y{/loop}"#).unwrap();
    assert!(out.contains("{% for key1, value1 in a %}"));
    assert!(out.contains("{% for key1, value1 in b %}"));
    assert!(!out.contains("value2"));
}

#[test]
fn test_explicit_key_value_loop() {
    let out = rewrite(r#"{loop="$lineas" as $num => $linea}x{/loop}"#).unwrap();
    assert_eq!(out, "{% for num, linea in lineas %}x{% endfor %}");
}

#[test]
fn test_explicit_value_only_loop() {
    let out = rewrite(r#"{loop="$lineas" as $linea}x{/loop}"#).unwrap();
    assert_eq!(out, "{% for linea in lineas %}x{% endfor %}");
}

#[test]
fn test_collection_expression_is_translated() {
    let out = rewrite(r#"{loop="$fsc->get_lineas()"}x{/loop}"#).unwrap();
    assert!(out.starts_with("{% for key1, value1 in fsc.get_lineas() %}"));
}

#[test]
fn test_c_style_loop_inclusive_bound() {
    let out = rewrite(r#"{loop="$i=1;$i<=10;$i++"}x{/loop}"#).unwrap();
    assert_eq!(out, "{% for i in range(1, 10) %}x{% endfor %}");
}

#[test]
fn test_c_style_loop_exclusive_bound() {
    let out = rewrite(r#"{loop="$i=0;$i<10;$i++"}x{/loop}"#).unwrap();
    assert_eq!(out, "{% for i in range(0, 10 - 1) %}x{% endfor %}");
}

#[test]
fn test_c_style_loop_dynamic_end_expression() {
    let out = rewrite(r#"{loop="$page_num=1;$page_num<=$fsc->total_pages;$page_num++"}x{/loop}"#)
        .unwrap();
    assert_eq!(
        out,
        "{% for page_num in range(1, fsc.total_pages) %}x{% endfor %}"
    );
}

#[test]
fn test_c_style_with_mismatched_variables_falls_through() {
    // Not a valid counting loop, so it is handled as a collection loop over
    // the translated expression (garbage in, plausible garbage out).
    let out = rewrite(r#"{loop="$i=1;$j<=10;$k++"}x{/loop}"#).unwrap();
    assert!(out.starts_with("{% for key1, value1 in "));
}

#[test]
fn test_unbalanced_close_is_an_error() {
    let err = rewrite("{/loop}").unwrap_err();
    assert!(matches!(
        err,
        TranslateError::UnbalancedLoops { opens: 0, closes: 1 }
    ));
}

#[test]
fn test_unclosed_open_is_an_error() {
    let err = rewrite(r#"{loop="$items"}x"#).unwrap_err();
    assert!(matches!(
        err,
        TranslateError::UnbalancedLoops { opens: 1, closes: 0 }
    ));
}

#[test]
fn test_balanced_nesting_returns_depth_to_zero() {
    // Three opens, three closes, no error: the counter balanced out.
    let out = rewrite(r#"{loop="$a"}{loop="$b"}{/loop}{loop="$c"}{/loop}{/loop}"#).unwrap();
    assert_eq!(out.matches("{% endfor %}").count(), 3);
    // Depth drops back to 1 after the first inner close, so the second
    // inner loop is numbered 2 again.
    assert_eq!(out.matches("in b %}").count(), 1);
    assert!(out.contains("{% for key2, value2 in b %}"));
    assert!(out.contains("{% for key2, value2 in c %}"));
}
