//! Contents: ordered slots in a module, each holding one item.

use super::courses::owned_module_in;
use super::{
    CONTENTS, COURSES, METADATA, MODULE_CONTENTS, MODULES, Store, allocate, children, io, load,
    save,
};
use crate::ordering::{OrderField, Reorder, sort_by_order};
use crate::primitives::MAX_ITEM_TITLE_LENGTH;
use crate::types::{Content, ContentId, EducaError, Item, ItemBody, ModuleId, UserId};
use crate::validation;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

/// A new item to append to a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub body: ItemBody,
}

/// Partial item update. A replacement body must be of the same kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub body: Option<ItemBody>,
}

impl Store {
    /// Create an item owned by `owner` and append it to a module of one of
    /// their courses.
    pub fn add_content(
        &self,
        owner: UserId,
        module: ModuleId,
        new: NewItem,
    ) -> Result<Content, EducaError> {
        let title = validation::title("title", &new.title, MAX_ITEM_TITLE_LENGTH)?;
        let body = validate_body(new.body)?;

        let write_txn = self.db.begin_write().map_err(io)?;
        let content = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let modules = write_txn.open_table(MODULES).map_err(io)?;
            owned_module_in(&courses, &modules, owner, module)?;

            let mut index = write_txn.open_table(MODULE_CONTENTS).map_err(io)?;
            let mut contents = write_txn.open_table(CONTENTS).map_err(io)?;
            let mut existing = Vec::new();
            for content_id in children(&index, module.0)? {
                if let Some(content) = load::<Content>(&contents, content_id)? {
                    existing.push(content.order);
                }
            }
            let order = OrderField::from_existing(existing).next();

            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let id = ContentId(allocate(&mut meta, "next_content_id")?);
            let now = Utc::now();
            let content = Content {
                id,
                module,
                order,
                item: Item {
                    owner,
                    title,
                    created: now,
                    updated: now,
                    body,
                },
            };
            save(&mut contents, id.0, &content)?;
            index.insert((module.0, id.0), ()).map_err(io)?;
            content
        };
        write_txn.commit().map_err(io)?;
        Ok(content)
    }

    /// Edit the item of a content owned by `owner`.
    pub fn update_content(
        &self,
        owner: UserId,
        id: ContentId,
        update: ItemUpdate,
    ) -> Result<Content, EducaError> {
        let title = update
            .title
            .map(|t| validation::title("title", &t, MAX_ITEM_TITLE_LENGTH))
            .transpose()?;
        let body = update.body.map(validate_body).transpose()?;

        let write_txn = self.db.begin_write().map_err(io)?;
        let content = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let modules = write_txn.open_table(MODULES).map_err(io)?;
            let mut contents = write_txn.open_table(CONTENTS).map_err(io)?;
            let mut content = owned_content_in(&courses, &modules, &contents, owner, id)?;

            if let Some(body) = body {
                if body.kind() != content.item.kind() {
                    return Err(EducaError::Validation(format!(
                        "content {id} is a {} item, not {}",
                        content.item.kind(),
                        body.kind()
                    )));
                }
                content.item.body = body;
            }
            if let Some(title) = title {
                content.item.title = title;
            }
            content.item.updated = Utc::now();
            save(&mut contents, id.0, &content)?;
            content
        };
        write_txn.commit().map_err(io)?;
        Ok(content)
    }

    /// Delete a content together with its item.
    pub fn delete_content(&self, owner: UserId, id: ContentId) -> Result<(), EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let modules = write_txn.open_table(MODULES).map_err(io)?;
            let mut contents = write_txn.open_table(CONTENTS).map_err(io)?;
            let content = owned_content_in(&courses, &modules, &contents, owner, id)?;
            contents.remove(id.0).map_err(io)?;
            let mut index = write_txn.open_table(MODULE_CONTENTS).map_err(io)?;
            index.remove((content.module.0, id.0)).map_err(io)?;
        }
        write_txn.commit().map_err(io)?;
        Ok(())
    }

    pub fn content(&self, id: ContentId) -> Result<Option<Content>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let contents = read_txn.open_table(CONTENTS).map_err(io)?;
        load(&contents, id.0)
    }

    /// Contents of a module sorted by `(order, id)`.
    pub fn contents(&self, module: ModuleId) -> Result<Vec<Content>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let index = read_txn.open_table(MODULE_CONTENTS).map_err(io)?;
        let contents = read_txn.open_table(CONTENTS).map_err(io)?;
        let mut found = Vec::new();
        for id in children(&index, module.0)? {
            if let Some(content) = load::<Content>(&contents, id)? {
                found.push(content);
            }
        }
        sort_by_order(&mut found, |c| (c.order, c.id));
        Ok(found)
    }

    /// Apply a batch of content positions; see [`Store::reorder_modules`].
    pub fn reorder_contents(
        &self,
        owner: UserId,
        batch: &Reorder<ContentId>,
    ) -> Result<usize, EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let updated = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let modules = write_txn.open_table(MODULES).map_err(io)?;
            let mut contents = write_txn.open_table(CONTENTS).map_err(io)?;
            let mut updated = 0;
            for (id, order) in batch.iter() {
                let Ok(mut content) = owned_content_in(&courses, &modules, &contents, owner, id)
                else {
                    continue;
                };
                content.order = order;
                save(&mut contents, id.0, &content)?;
                updated += 1;
            }
            updated
        };
        write_txn.commit().map_err(io)?;
        Ok(updated)
    }
}

/// Load a content whose module's course belongs to `owner`.
fn owned_content_in(
    courses: &impl ReadableTable<u64, &'static [u8]>,
    modules: &impl ReadableTable<u64, &'static [u8]>,
    contents: &impl ReadableTable<u64, &'static [u8]>,
    owner: UserId,
    id: ContentId,
) -> Result<Content, EducaError> {
    let content: Content =
        load(contents, id.0)?.ok_or_else(|| EducaError::not_found("content", id))?;
    owned_module_in(courses, modules, owner, content.module)
        .map_err(|_| EducaError::not_found("content", id))?;
    Ok(content)
}

fn validate_body(body: ItemBody) -> Result<ItemBody, EducaError> {
    Ok(match body {
        ItemBody::Text { content } => ItemBody::Text {
            content: validation::text("content", &content)?,
        },
        ItemBody::Image { file } => ItemBody::Image {
            file: validation::file_reference(&file)?,
        },
        ItemBody::File { file } => ItemBody::File {
            file: validation::file_reference(&file)?,
        },
        ItemBody::Video { url } => ItemBody::Video {
            url: validation::url(&url)?,
        },
    })
}

// =============================================================================
// TESTS
// =============================================================================
