use codspeed_criterion_compat::{
    Criterion, Throughput, black_box, criterion_group, criterion_main,
};

static MARKUP: &str = r#"
<ul class="nav">
  <li><a href="/">Home</a></li>
  <li><a href="/about/">About</a></li>
  <li><a href="/blog/">Blog</a></li>
  <li><a href="/contact/">Contact</a></li>
</ul>
<p>It was the year when they finally immanentized the Eschaton.</p>
"#;

static TAGS: &str = r#"
{% for entry in entries reversed %}{{ entry.title|title|truncatewords:10 }}{% endfor %}
{% if user.is_staff and not debug or count >= 3 %}{{ user|default:"anon" }}{% endif %}
{% with total=business.employees.count only %}{% url 'home' as link %}{% endwith %}
{# short comment #}{% comment "why" %}{{ not parsed }}{% endcomment %}
{% for entry in entries reversed %}{{ entry.title|title|truncatewords:10 }}{% endfor %}
{% if user.is_staff and not debug or count >= 3 %}{{ user|default:"anon" }}{% endif %}
{% with total=business.employees.count only %}{% url 'home' as link %}{% endwith %}
{# short comment #}{% comment "why" %}{{ not parsed }}{% endcomment %}
"#;

static CANDIDATES: [(&str, &str); 2] = [("markup", MARKUP), ("tags_and_variables", TAGS)];

fn iterate(s: &str) {
    use dtl_tokenizer::{SyntaxKind, Tokenizer};

    let mut tokenizer = Tokenizer::new(s);

    loop {
        let token = tokenizer.next_token();

        if token.kind == SyntaxKind::EOF {
            break;
        }

        black_box(token);
    }
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for (name, source) in CANDIDATES {
        let source = source.repeat(20);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(name, &source, |b, s| b.iter(|| iterate(s)));
    }
}

criterion_group!(benches, bench_iterate);
criterion_main!(benches);
