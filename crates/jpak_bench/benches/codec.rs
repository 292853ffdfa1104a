use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jpak_core::{pack, unpack, HashTable, LoadedDictionary};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

const ALPHABET: &[&str] = &[
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z", "\\\"", " ",
];

fn rand_key(rng: &mut StdRng) -> String {
    let n = rng.random_range(0..=10);
    ALPHABET.choose_multiple(rng, n).copied().collect()
}

/// Up to 10 fields per record; values are booleans, integers or short strings.
fn corpus(records: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::new();
    for _ in 0..records {
        let mut keys: Vec<String> = Vec::new();
        for _ in 0..rng.random_range(0..10) {
            let k = rand_key(&mut rng);
            if !keys.contains(&k) {
                keys.push(k);
            }
        }
        let fields: Vec<String> = keys
            .iter()
            .map(|k| {
                let v = match rng.random_range(0..4) {
                    0 => "true".to_string(),
                    1 => "false".to_string(),
                    2 => rng.random_range(-1_000_000..1_000_000).to_string(),
                    _ => format!("\"{}\"", rand_key(&mut rng)),
                };
                format!("\"{k}\":{v}")
            })
            .collect();
        out.push('{');
        out.push_str(&fields.join(","));
        out.push_str("}\n");
    }
    out
}

fn bench_codec(c: &mut Criterion) {
    let src = corpus(1000, 7);

    c.bench_function("pack", |b| {
        b.iter(|| {
            let mut out = Cursor::new(Vec::with_capacity(src.len()));
            black_box(pack(src.as_bytes(), &mut out).unwrap())
        })
    });

    let mut bin = Cursor::new(Vec::new());
    let (keys, _) = pack(src.as_bytes(), &mut bin).unwrap();
    let bin = bin.into_inner();
    let mut dict_bytes = Vec::new();
    keys.write_to(&mut dict_bytes).unwrap();
    let dict = LoadedDictionary::load(&dict_bytes).unwrap();

    c.bench_function("unpack", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(src.len());
            black_box(unpack(&bin, &dict, &mut out).unwrap())
        })
    });

    let words: Vec<Box<[u8]>> = (0..10_000).map(|i| format!("key-{i}").into_bytes().into()).collect();
    c.bench_function("table_put_get", |b| {
        b.iter(|| {
            let mut t: HashTable<Box<[u8]>, usize> = HashTable::new();
            for (i, w) in words.iter().enumerate() {
                t.put(w.clone(), i);
            }
            black_box(words.iter().filter(|w| t.has(w)).count())
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
