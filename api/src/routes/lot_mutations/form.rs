use crate::error::ApiError;
use axum::extract::Multipart;
use lots::domain::LotDraft;
use lots::images::ImageChanges;
use lots::storage::ImageFile;

const NEW_IMAGES: &str = "NewImages";
const DELETE_IMAGES: &str = "DeleteImagesNames";
const OLD_IMAGES: &str = "OldImagesNames";

/// Lot create/update form. Unknown text fields are ignored, the sale status
/// in particular can not be set through it.
#[derive(Debug, Default)]
pub struct LotForm {
    pub draft: LotDraft,
    pub new_images: Vec<ImageFile>,
    pub delete_images: Vec<String>,
    pub old_images: Vec<String>,
}

impl LotForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                NEW_IMAGES => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content = field.bytes().await?;
                    if !content.is_empty() {
                        form.new_images.push(ImageFile { filename, content });
                    }
                }
                DELETE_IMAGES => form.delete_images.push(field.text().await?),
                OLD_IMAGES => form.old_images.push(field.text().await?),
                _ => {
                    let value = field.text().await?;
                    form.set(&name, value)?;
                }
            }
        }
        Ok(form)
    }

    fn set(&mut self, name: &str, value: String) -> Result<(), ApiError> {
        let draft = &mut self.draft;
        match name {
            "Brand" => draft.brand = value,
            "Model" => draft.model = value,
            "Engine" => draft.engine = value,
            "Transmission" => draft.transmission = value,
            "WheelDrive" => draft.wheel_drive = value,
            "Color" => draft.color = value,
            "VinCode" => draft.vin_code = value,
            "Description" => draft.description = value,
            "MadeYear" => draft.made_year = parse_int(name, &value)?,
            "Mileage" => draft.mileage = parse_int(name, &value)?,
            "SalePrice" => draft.sale_price = parse_int(name, &value)?,
            _ => {}
        }
        Ok(())
    }

    pub fn image_changes(self) -> (LotDraft, ImageChanges) {
        (
            self.draft,
            ImageChanges {
                new_files: self.new_images,
                delete: self.delete_images,
                old: self.old_images,
            },
        )
    }
}

/// Web clients send `null`/`undefined` for untouched numeric inputs.
pub fn parse_int(name: &str, value: &str) -> Result<i32, ApiError> {
    match value.trim() {
        "" | "null" | "undefined" => Ok(0),
        trimmed => trimmed
            .parse()
            .map_err(|_| ApiError::InvalidForm(format!("`{name}` is not an integer: `{value}`"))),
    }
}
