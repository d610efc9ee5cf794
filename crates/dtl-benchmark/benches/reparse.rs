use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use dtl_parse::{InputEdit, Parser, language};
use text_size::{TextRange, TextSize};

static ROW: &str =
    "<tr>{% for cell in row %}<td>{{ cell.value|floatformat:2 }}</td>{% endfor %}</tr>\n";

/// Typing one character into the middle of a large template.
fn benchmark_reparse(c: &mut Criterion) {
    let mut parser = Parser::new();
    parser.set_language(language()).unwrap();

    let text = ROW.repeat(200);
    let offset = TextSize::new(ROW.len() as u32 * 100 + 41);
    let range = TextRange::empty(offset);
    let mut new_text = text.clone();
    new_text.insert(offset.into(), 'x');

    let old = parser.parse(&text, None).unwrap();
    let edited = old.edit(&InputEdit::replace(&text, range, "x")).unwrap();

    let mut group = c.benchmark_group("Reparse Benchmark");
    group.throughput(Throughput::Bytes(new_text.len() as u64));

    group.bench_with_input(BenchmarkId::new("incremental", "table"), &edited, |b, edited| {
        b.iter(|| black_box(parser.parse(&new_text, Some(edited)).unwrap()));
    });
    group.bench_with_input(BenchmarkId::new("from_scratch", "table"), &new_text, |b, text| {
        b.iter(|| black_box(parser.parse(text, None).unwrap()));
    });
    group.bench_function(BenchmarkId::new("edit", "table"), |b| {
        b.iter(|| black_box(old.edit(&InputEdit::replace(&text, range, "x")).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_reparse);
criterion_main!(benches);
