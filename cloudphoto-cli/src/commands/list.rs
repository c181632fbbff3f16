use anyhow::{Context, Result};
use cloudphoto_core::{AlbumQuery, Argument, Command, Config, ObjectStore, TagIndex};

pub async fn execute(store: &dyn ObjectStore, config: &Config, command: &Command) -> Result<()> {
    let album = command.parameter(Argument::Album).unwrap_or_default();

    let index = TagIndex::new(store, &config.tag_key);
    let result = index
        .query_by_album(album)
        .await
        .context("Failed to query the album index")?;

    for line in render(album, &result) {
        println!("{line}");
    }

    Ok(())
}

fn render(album: &str, result: &AlbumQuery) -> Vec<String> {
    match result {
        AlbumQuery::Albums(albums) if albums.is_empty() => vec!["!No albums".to_string()],
        AlbumQuery::Albums(albums) => albums.iter().map(|name| format!("*{name}")).collect(),
        AlbumQuery::Images(images) if images.is_empty() => {
            vec![format!("!No images of \"{album}\" album")]
        }
        AlbumQuery::Images(images) => images
            .iter()
            .map(|object| format!("*{}", object.key))
            .collect(),
    }
}
