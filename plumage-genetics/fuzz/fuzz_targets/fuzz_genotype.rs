#![no_main]
use libfuzzer_sys::fuzz_target;
use plumage_core::Sex;
use plumage_genetics::LocusRegistry;

fuzz_target!(|data: &str| {
    let Ok(registry) = LocusRegistry::builtin() else {
        return;
    };
    for locus in registry.iter() {
        let _ = plumage_genetics::parse_alleles_checked(data, locus);
        let _ = plumage_genetics::parse_hemizygous(data, locus);
    }
    let _ = plumage_genetics::Genotype::parse(&registry, Sex::Female, [("ino", data), ("parblue", data)]);
});
