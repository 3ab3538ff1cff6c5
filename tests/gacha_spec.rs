use std::collections::HashMap;

use pocket_zoo::models::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speculate2::speculate;

const PULLS: usize = 100_000;

fn frequencies(seed: u64) -> HashMap<Rarity, f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut counts: HashMap<Rarity, usize> = HashMap::new();
    for _ in 0..PULLS {
        *counts.entry(select_rarity(rng.gen::<f64>())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(rarity, n)| (rarity, n as f64 / PULLS as f64))
        .collect()
}

speculate! {
    describe "rarity distribution" {
        before {
            let freq = frequencies(42);
            let share = |r: Rarity| freq.get(&r).copied().unwrap_or(0.0);
        }

        it "lands on common about 95% of the time" {
            let common = share(Rarity::Common);
            assert!((0.94..=0.96).contains(&common), "common share {}", common);
        }

        it "lands on uncommon about 4% of the time" {
            let uncommon = share(Rarity::Uncommon);
            assert!((0.035..=0.045).contains(&uncommon), "uncommon share {}", uncommon);
        }

        it "keeps legendary and epic rare" {
            let legendary = share(Rarity::Legendary);
            let epic = share(Rarity::Epic);
            assert!((0.006..=0.012).contains(&legendary), "legendary share {}", legendary);
            assert!(epic <= 0.002, "epic share {}", epic);
        }
    }

    describe "pulls" {
        before {
            let mut rng = StdRng::seed_from_u64(9);
        }

        it "always returns an animal from the requested pack" {
            for _ in 0..1_000 {
                let won = pull("rodent", &mut rng).expect("rodent pack has commons");
                assert_eq!(won.pack, "rodent");
            }
        }

        it "reports unknown packs as an empty pool" {
            assert!(matches!(pull("nope", &mut rng), Err(GachaError::EmptyPool(..))));
        }

        it "flags the premium pack as missing commons" {
            assert_eq!(packs_without_commons(), vec!["premium"]);
        }
    }
}
