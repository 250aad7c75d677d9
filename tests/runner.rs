use anyhow::Result;
use tagtally::{CombinePolicy, ExecMode, Pipeline, Runner, Sum, from_iter, from_vec, merge_counts};

fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{}", (i * 7919) % 137)).collect()
}

fn runners() -> Vec<Runner> {
    let mut out = Vec::new();
    for combine in [
        CombinePolicy::Never,
        CombinePolicy::Once,
        CombinePolicy::Spill(1),
        CombinePolicy::Spill(13),
    ] {
        out.push(Runner {
            mode: ExecMode::Sequential,
            combine,
            ..Runner::default()
        });
        for partitions in [1, 3, 8] {
            out.push(Runner {
                mode: ExecMode::Parallel {
                    threads: Some(4),
                    partitions: Some(partitions),
                },
                combine,
                ..Runner::default()
            });
        }
    }
    out
}

#[test]
fn every_runner_agrees_on_counts() -> Result<()> {
    let data = words(5_000);
    let p = Pipeline::default();
    let expected = from_vec(&p, data.clone())
        .key_by(|w: &String| w.clone())
        .map_values(|_| 1u64)
        .combine_values(Sum)
        .collect_seq_sorted()?;
    assert_eq!(expected.len(), 137);
    assert_eq!(expected.iter().map(|(_, c)| c).sum::<u64>(), 5_000);

    for runner in runners() {
        let p = Pipeline::default();
        let got = from_vec(&p, data.clone())
            .map(|w: &String| (w.clone(), 1u64))
            .combine_values(Sum)
            .collect_sorted_by_key_with(&runner)?;
        assert_eq!(got, expected, "{runner:?}");
    }
    Ok(())
}

#[test]
fn grouping_then_summing_matches_combining() -> Result<()> {
    let p = Pipeline::default();
    let pairs = from_vec(&p, words(3_000)).map(|w: &String| (w.clone(), 1u64));

    let combined = pairs.clone().combine_values(Sum).collect_par_sorted_by_key(None, Some(5))?;
    let grouped = pairs
        .group_by_key()
        .map(|(k, vs): &(String, Vec<u64>)| (k.clone(), merge_counts(vs.iter().copied())))
        .collect_par_sorted_by_key(None, Some(5))?;

    assert_eq!(combined, grouped);
    Ok(())
}

#[test]
fn global_combine_emits_one_value_even_when_empty() -> Result<()> {
    let p = Pipeline::default();
    let total = from_vec(&p, Vec::<u64>::new())
        .combine_globally(Sum)
        .collect_par(None, Some(4))?;
    assert_eq!(total, vec![0]);

    let total = from_iter(&p, 1..=100u64)
        .filter(|n: &u64| n % 2 == 0)
        .combine_globally(Sum)
        .collect_with(&Runner {
            combine: CombinePolicy::Never,
            ..Runner::default()
        })?;
    assert_eq!(total, vec![2_550]);
    Ok(())
}

#[test]
fn stateless_chain_after_a_barrier_runs() -> Result<()> {
    let p = Pipeline::default();
    let out = from_vec(&p, vec![("a".to_string(), 2u64), ("b".to_string(), 3), ("a".to_string(), 4)])
        .combine_values(Sum)
        .map_values(|n: &u64| n * 10)
        .flat_map(|(k, n): &(String, u64)| vec![k.clone(); (*n / 30) as usize])
        .collect_seq_sorted()?;
    assert_eq!(out, vec!["a", "a", "b"]);
    Ok(())
}

#[test]
fn pipeline_grows_one_node_per_transform() {
    let p = Pipeline::default();
    let _ = from_vec(&p, vec![1u64, 2, 3])
        .map(|n: &u64| n + 1)
        .filter(|n: &u64| *n > 2)
        .combine_globally(Sum);
    assert_eq!(p.node_count(), 4);
}
