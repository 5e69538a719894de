/// Built-in rules: (question substrings, canonical answer, confidence).
pub(super) const BUILTIN_RULES: &[(&[&str], &str, f32)] = &[
    (&["capital of france", "capital france"], "Paris", 0.95),
    (&["capital of italy", "capital italy"], "Rome", 0.95),
    (&["capital of germany", "capital germany"], "Berlin", 0.95),
    (&["capital of spain", "capital spain"], "Madrid", 0.95),
    (&["capital of japan", "capital japan"], "Tokyo", 0.95),
    (&["capital of australia", "capital australia"], "Canberra", 0.9),
    (&["capital of canada", "capital canada"], "Ottawa", 0.9),
    (&["2+2", "2 + 2", "two plus two"], "four", 0.95),
    (&["3x3", "3 x 3", "three times three"], "nine", 0.95),
    (&["5+5", "5 + 5", "five plus five"], "ten", 0.95),
    (&["largest planet", "biggest planet"], "Jupiter", 0.9),
    (&["red planet"], "Mars", 0.9),
    (&["largest ocean", "biggest ocean"], "Pacific Ocean", 0.9),
    (&["largest mammal", "biggest mammal"], "Blue whale", 0.85),
    (&["longest river"], "Nile", 0.75),
    (&["mona lisa"], "Leonardo da Vinci", 0.9),
    (&["romeo and juliet", "wrote hamlet"], "William Shakespeare", 0.9),
    (&["chemical symbol for gold", "symbol for gold"], "Au", 0.9),
    (&["chemical formula for water", "formula of water"], "H2O", 0.9),
    (&["what is h2o", "h2o is commonly"], "Water", 0.85),
    (&["hardest natural substance", "hardest mineral"], "Diamond", 0.85),
    (&["how many continents"], "7", 0.85),
    (&["smallest prime"], "2", 0.9),
    (&["boiling point of water"], "100°C", 0.8),
    (&["freezing point of water"], "0°C", 0.8),
    (&["closest star to earth", "nearest star to earth"], "The Sun", 0.8),
];
