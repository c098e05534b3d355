use hexsheet::preview::{PreviewRule, RangeSnapshot};

fn main() {
    env_logger::init();

    let range = RangeSnapshot::from_rows([
        ["#336699", "hello", "#abc"],
        ["totals", "#FF0000", ""],
    ]);

    for write in PreviewRule::new().plan(&range) {
        println!(
            "({}, {}): background {}, foreground {}",
            write.row, write.col, write.background, write.foreground
        );
    }
}
