use dtl_errors::Diagnostic;
use dtl_syntax::SyntaxNode;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct Document<'a> {
    root: Node<'a>,
    diagnostics: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Node<'a> {
    kind: &'static str,
    start: u32,
    end: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    named: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
    start: u32,
    end: u32,
}

impl<'a> Document<'a> {
    pub(crate) fn new(root: SyntaxNode<'_>, diagnostics: &'a [Diagnostic], text: &'a str) -> Self {
        let diagnostics = diagnostics
            .iter()
            .map(|diagnostic| Message {
                message: diagnostic.message(),
                start: diagnostic.range().start().into(),
                end: diagnostic.range().end().into(),
            })
            .collect();
        Self { root: Node::new(root, text), diagnostics }
    }
}

impl<'a> Node<'a> {
    fn new(node: SyntaxNode<'_>, text: &'a str) -> Self {
        Self {
            kind: node.kind().name(),
            start: node.start().into(),
            end: node.end().into(),
            named: node.is_named(),
            text: node.is_token().then(|| node.text(text)),
            children: node.children().map(|child| Self::new(child, text)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn document_shape() {
        let text = "{{ a }";
        let tree = dtl_parse::parse(text);
        let document = Document::new(tree.root(), tree.diagnostics(), text);
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["root"]["kind"], "template");
        assert_eq!(json["root"]["end"], 6);
        let open = &json["root"]["children"][0]["children"][0];
        expect![[r#"{"end":2,"kind":"{{","start":0,"text":"{{"}"#]].assert_eq(&open.to_string());
        assert_eq!(json["diagnostics"][0]["start"], 0);
    }
}
